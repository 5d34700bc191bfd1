//! crates/archive_core/src/sync.rs
//!
//! The synchronization engine. It owns the live collection, loads it once at
//! startup, and writes every new collection through to the structured store
//! (when one is injected) and to the flat mirror (always).

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::Collection;
use crate::ports::{BackendKind, DocumentStore, PortError, StorageBackends};

/// Which store the engine treats as authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryBackend {
    Structured,
    FlatOnly,
}

/// Where the collection came from at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Structured,
    /// Flat store, because the structured store was absent or failed.
    Flat,
    /// Flat mirror adopted because the structured store was empty.
    FlatSeed,
    /// Nothing stored anywhere, or every store failed.
    Empty,
}

/// A write that did not land. In-memory state is already updated when this is reported.
#[derive(Debug)]
pub struct WriteFailure {
    pub backend: BackendKind,
    pub error: PortError,
}

/// Outcome of one `persist` call.
#[derive(Debug, Default)]
pub struct PersistReport {
    pub failures: Vec<WriteFailure>,
}

impl PersistReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, backend: BackendKind) -> bool {
        self.failures.iter().any(|f| f.backend == backend)
    }
}

pub struct SyncEngine {
    collection: Collection,
    primary: PrimaryBackend,
    load_source: LoadSource,
    structured: Option<Arc<dyn DocumentStore>>,
    flat: Arc<dyn DocumentStore>,
}

impl SyncEngine {
    /// Loads the collection from the injected backends and returns the engine.
    ///
    /// This is the only constructor, so state is populated exactly once before
    /// any mutation can be issued.
    pub async fn initialize(backends: StorageBackends) -> Self {
        let StorageBackends { structured, flat } = backends;

        let primary = if structured.is_some() {
            PrimaryBackend::Structured
        } else {
            PrimaryBackend::FlatOnly
        };

        let mut engine = Self {
            collection: Collection::new(),
            primary,
            load_source: LoadSource::Empty,
            structured,
            flat,
        };

        let (collection, source) = engine.load().await;
        info!(
            "Archive initialized with {} documents (primary: {:?}, source: {:?})",
            collection.len(),
            engine.primary,
            source
        );
        engine.collection = collection;
        engine.load_source = source;

        if source == LoadSource::FlatSeed {
            if let Some(structured) = &engine.structured {
                if let Err(e) = structured.replace_all(&engine.collection).await {
                    error!("Failed to seed structured store from flat mirror: {}", e);
                }
            }
        }
        engine
    }

    async fn load(&self) -> (Collection, LoadSource) {
        if let Some(structured) = &self.structured {
            match structured.load_all().await {
                Ok(collection) if !collection.is_empty() => {
                    return (collection, LoadSource::Structured);
                }
                Ok(_) => {
                    // Structured store is empty. Adopt the mirror if it has anything,
                    // e.g. the first start with a database after running flat-only.
                    return match self.flat.load_all().await {
                        Ok(mirror) if !mirror.is_empty() => {
                            info!(
                                "Structured store empty, seeding from {} mirrored documents",
                                mirror.len()
                            );
                            (mirror, LoadSource::FlatSeed)
                        }
                        Ok(_) => (Collection::new(), LoadSource::Empty),
                        Err(e) => {
                            error!("Flat mirror unreadable, starting with an empty archive: {}", e);
                            (Collection::new(), LoadSource::Empty)
                        }
                    };
                }
                Err(e) => {
                    warn!("Structured store unavailable, falling back to flat store: {}", e);
                }
            }
        }

        match self.flat.load_all().await {
            Ok(collection) if collection.is_empty() => (collection, LoadSource::Empty),
            Ok(collection) => (collection, LoadSource::Flat),
            Err(e) => {
                error!("Flat store unreadable, starting with an empty archive: {}", e);
                (Collection::new(), LoadSource::Empty)
            }
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn primary(&self) -> PrimaryBackend {
        self.primary
    }

    pub fn load_source(&self) -> LoadSource {
        self.load_source
    }

    /// Makes `collection` the live state and writes it through.
    ///
    /// Memory is updated first and never rolled back. The structured store gets
    /// a full replace when it is primary; the flat mirror is written regardless
    /// of whether that succeeded.
    pub async fn persist(&mut self, collection: Collection) -> PersistReport {
        self.collection = collection;
        let mut report = PersistReport::default();

        if self.primary == PrimaryBackend::Structured {
            if let Some(structured) = &self.structured {
                if let Err(e) = structured.replace_all(&self.collection).await {
                    error!("Failed to save to structured store: {}", e);
                    report.failures.push(WriteFailure {
                        backend: BackendKind::Structured,
                        error: e,
                    });
                }
            }
        }

        if let Err(e) = self.flat.replace_all(&self.collection).await {
            error!("Failed to mirror to flat store: {}", e);
            report.failures.push(WriteFailure {
                backend: BackendKind::Flat,
                error: e,
            });
        }

        report
    }
}
