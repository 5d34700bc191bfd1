//! crates/archive_core/src/bundle.rs
//!
//! Export of the collection to a portable backup bundle, and the id-based
//! merge of an incoming bundle into the live collection. Nothing here touches
//! storage; callers persist the merged result themselves.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::domain::{BackupBundle, Collection, Document};

/// Format version written into every exported bundle.
pub const BUNDLE_FORMAT_VERSION: &str = "1.0";

/// Reasons a backup file is rejected before any merge happens.
#[derive(Debug, thiserror::Error)]
pub enum ImportFormatError {
    #[error("Backup is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Backup must be a JSON object")]
    NotAnObject,
    #[error("Backup has no `documents` field")]
    MissingDocuments,
    #[error("Backup `documents` field is not an array")]
    DocumentsNotArray,
    #[error("Backup document #{index} is malformed: {reason}")]
    InvalidDocument { index: usize, reason: String },
}

/// Wraps `collection` with the format version and `now`.
pub fn export_bundle(collection: &Collection, now: DateTime<Utc>) -> BackupBundle {
    BackupBundle {
        version: BUNDLE_FORMAT_VERSION.to_string(),
        timestamp: now,
        documents: collection.clone(),
    }
}

impl BackupBundle {
    /// Pretty-printed JSON, as written to the downloadable file.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// `archive-backup_<YYYY-MM-DD>.json`, dated by the bundle timestamp.
    pub fn file_name(&self) -> String {
        format!("archive-backup_{}.json", self.timestamp.format("%Y-%m-%d"))
    }
}

/// Parses backup text and returns its documents, in file order.
///
/// Only `documents` is required. `version` and `timestamp` are informational.
pub fn parse_bundle(raw: &str) -> Result<Vec<Document>, ImportFormatError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ImportFormatError::InvalidJson(e.to_string()))?;
    let Value::Object(mut root) = value else {
        return Err(ImportFormatError::NotAnObject);
    };

    if let Some(version) = root.get("version").and_then(Value::as_str) {
        if version != BUNDLE_FORMAT_VERSION {
            warn!("Importing backup with unknown format version '{}'", version);
        }
    }

    let entries = match root.remove("documents") {
        None | Some(Value::Null) => return Err(ImportFormatError::MissingDocuments),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ImportFormatError::DocumentsNotArray),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<Document>(entry).map_err(|e| {
                ImportFormatError::InvalidDocument {
                    index,
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}

/// Union of `incoming` and `current`, deduplicated by id.
///
/// The result follows the order of `incoming ++ current`, each id at its first
/// occurrence. When an id appears in both, the incoming document is kept.
/// Within `incoming`, a repeated id resolves to its last occurrence.
pub fn merge_bundle(incoming: Vec<Document>, current: &Collection) -> Collection {
    let mut merged = Collection::from_documents(incoming);
    for doc in current {
        merged.push_if_absent(doc.clone());
    }
    merged
}
