//! services/archive/src/web/state.rs
//!
//! Defines the application's shared state and the startup wiring of the
//! storage backends.

use crate::adapters::{FileKeyValueStore, SqliteDocumentStore};
use crate::config::Config;
use crate::error::ApiError;
use archive_core::flat::FlatDocumentStore;
use archive_core::ports::StorageBackends;
use archive_core::Archive;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The archive sits behind a fair async mutex held for the whole mutation,
/// storage writes included, so concurrent requests persist in arrival order.
pub struct AppState {
    pub archive: Mutex<Archive>,
}

impl AppState {
    pub fn new(archive: Archive) -> Self {
        Self {
            archive: Mutex::new(archive),
        }
    }
}

//=========================================================================================
// Backend Wiring
//=========================================================================================

/// Opens and migrates the SQLite store named by `database_url`.
pub async fn open_structured_store(database_url: &str) -> Result<SqliteDocumentStore, ApiError> {
    let store = SqliteDocumentStore::connect(database_url).await?;
    store.run_migrations().await?;
    Ok(store)
}

/// Chooses the storage backends once, at startup.
///
/// The flat store is always present. The structured store is used only when
/// configured and reachable; otherwise the archive runs flat-only.
pub async fn build_backends(config: &Config) -> StorageBackends {
    let flat = Arc::new(FlatDocumentStore::new(FileKeyValueStore::new(
        config.flat_store_dir.clone(),
    )));
    info!("Flat store at {}", config.flat_store_dir.display());

    let Some(database_url) = config.database_url.as_deref() else {
        info!("No DATABASE_URL configured, running flat-only.");
        return StorageBackends::flat_only(flat);
    };

    info!("Connecting to structured store...");
    match open_structured_store(database_url).await {
        Ok(store) => {
            info!("Structured store ready.");
            StorageBackends::with_structured(Arc::new(store), flat)
        }
        Err(e) => {
            warn!("Structured store unavailable, running flat-only: {}", e);
            StorageBackends::flat_only(flat)
        }
    }
}
