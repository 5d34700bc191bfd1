pub mod archive;
pub mod bundle;
pub mod domain;
pub mod flat;
pub mod ports;
pub mod sync;

pub use archive::{Archive, DeleteOutcome, ImportOutcome};
pub use bundle::{export_bundle, merge_bundle, parse_bundle, ImportFormatError};
pub use domain::{BackupBundle, Category, Collection, Document, DocumentId, DocumentMetadata};
pub use flat::FlatDocumentStore;
pub use ports::{
    AlwaysProceed, BackendKind, ConfirmRequest, ConfirmationService, DocumentStore, FixedDecision,
    Intent, KeyValueStore, PortError, PortResult, StorageBackends,
};
pub use sync::{LoadSource, PersistReport, PrimaryBackend, SyncEngine};
