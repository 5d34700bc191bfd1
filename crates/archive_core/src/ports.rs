//! crates/archive_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the archive's core logic.
//! These traits form the boundary of the hexagonal architecture: the core never
//! knows whether documents live in SQLite, in a file, or in memory.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::domain::{Collection, DocumentId};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The backend is missing, unreachable, or returned data that cannot be read.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    /// A write was attempted and did not complete.
    #[error("Storage write failed: {0}")]
    WriteFailed(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports
//=========================================================================================

/// Which kind of store sits behind a `DocumentStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Queryable store with row-level insert and delete.
    Structured,
    /// A single serialized blob under a fixed key.
    Flat,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Structured => f.write_str("structured"),
            BackendKind::Flat => f.write_str("flat"),
        }
    }
}

/// Whole-collection persistence. Implementations must catch every failure and
/// report it as a `PortError`; nothing may panic past this boundary.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Reads every stored document, in collection order.
    async fn load_all(&self) -> PortResult<Collection>;

    /// Replaces the stored documents with `collection`.
    async fn replace_all(&self, collection: &Collection) -> PortResult<()>;
}

/// Raw string key/value storage underneath the flat document store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;
}

/// The backends the synchronization engine runs against, chosen once at startup.
#[derive(Clone)]
pub struct StorageBackends {
    pub structured: Option<Arc<dyn DocumentStore>>,
    pub flat: Arc<dyn DocumentStore>,
}

impl StorageBackends {
    pub fn flat_only(flat: Arc<dyn DocumentStore>) -> Self {
        Self {
            structured: None,
            flat,
        }
    }

    pub fn with_structured(structured: Arc<dyn DocumentStore>, flat: Arc<dyn DocumentStore>) -> Self {
        Self {
            structured: Some(structured),
            flat,
        }
    }
}

//=========================================================================================
// Confirmation Port
//=========================================================================================

/// A destructive action that needs the user's go-ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmRequest {
    Delete { id: DocumentId },
    /// Importing `count` documents from a backup bundle.
    Import { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Proceed,
    Cancel,
}

#[async_trait]
pub trait ConfirmationService: Send + Sync {
    async fn confirm(&self, request: &ConfirmRequest) -> Intent;
}

/// Confirms everything. For callers that already asked the user up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysProceed;

#[async_trait]
impl ConfirmationService for AlwaysProceed {
    async fn confirm(&self, _request: &ConfirmRequest) -> Intent {
        Intent::Proceed
    }
}

/// Answers every request with a fixed decision, e.g. a `?confirm=` query flag.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub Intent);

impl FixedDecision {
    pub fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Self(Intent::Proceed)
        } else {
            Self(Intent::Cancel)
        }
    }
}

#[async_trait]
impl ConfirmationService for FixedDecision {
    async fn confirm(&self, _request: &ConfirmRequest) -> Intent {
        self.0
    }
}
