//! crates/archive_core/src/archive.rs
//!
//! The application-facing API: a narrow set of mutations over the collection
//! owned by the synchronization engine. Destructive actions ask a
//! `ConfirmationService` first.

use chrono::Utc;
use tracing::info;

use crate::bundle::{self, ImportFormatError};
use crate::domain::{BackupBundle, Collection, Document, DocumentId};
use crate::ports::{ConfirmRequest, ConfirmationService, Intent, StorageBackends};
use crate::sync::{PersistReport, SyncEngine};

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted(PersistReport),
    NotFound,
    Cancelled,
}

#[derive(Debug)]
pub enum ImportOutcome {
    Imported {
        /// Documents in the backup file.
        incoming: usize,
        /// Collection size after the merge.
        total: usize,
        report: PersistReport,
    },
    Cancelled,
}

pub struct Archive {
    engine: SyncEngine,
}

impl Archive {
    pub async fn initialize(backends: StorageBackends) -> Self {
        Self {
            engine: SyncEngine::initialize(backends).await,
        }
    }

    pub fn collection(&self) -> &Collection {
        self.engine.collection()
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Prepends `doc`. An existing document with the same id is replaced.
    pub async fn add_document(&mut self, doc: Document) -> PersistReport {
        let mut next = self.engine.collection().clone();
        if next.prepend(doc).is_some() {
            info!("Replaced existing document with the same id");
        }
        self.engine.persist(next).await
    }

    pub async fn delete_document(
        &mut self,
        id: &DocumentId,
        confirmer: &dyn ConfirmationService,
    ) -> DeleteOutcome {
        if !self.engine.collection().contains(id) {
            return DeleteOutcome::NotFound;
        }
        let request = ConfirmRequest::Delete { id: id.clone() };
        if confirmer.confirm(&request).await == Intent::Cancel {
            return DeleteOutcome::Cancelled;
        }

        let mut next = self.engine.collection().clone();
        next.remove(id);
        info!("Deleting document {}", id);
        DeleteOutcome::Deleted(self.engine.persist(next).await)
    }

    /// Merges a backup file into the archive.
    ///
    /// The text is fully validated before the user is asked anything, so a
    /// format error always leaves the collection untouched.
    pub async fn import_bundle(
        &mut self,
        raw: &str,
        confirmer: &dyn ConfirmationService,
    ) -> Result<ImportOutcome, ImportFormatError> {
        let incoming = bundle::parse_bundle(raw)?;
        let count = incoming.len();

        let request = ConfirmRequest::Import { count };
        if confirmer.confirm(&request).await == Intent::Cancel {
            return Ok(ImportOutcome::Cancelled);
        }

        let merged = bundle::merge_bundle(incoming, self.engine.collection());
        let total = merged.len();
        info!("Importing {} documents, archive now holds {}", count, total);
        let report = self.engine.persist(merged).await;
        Ok(ImportOutcome::Imported {
            incoming: count,
            total,
            report,
        })
    }

    pub fn export_bundle(&self) -> BackupBundle {
        bundle::export_bundle(self.engine.collection(), Utc::now())
    }
}
