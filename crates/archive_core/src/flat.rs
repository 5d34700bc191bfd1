//! crates/archive_core/src/flat.rs
//!
//! The flat fallback store: the whole collection serialized as one JSON array
//! under a single key of a `KeyValueStore`.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::domain::Collection;
use crate::ports::{BackendKind, DocumentStore, KeyValueStore, PortError, PortResult};

/// Key every save writes to.
pub const CANONICAL_KEY: &str = "vaulty_docs";

/// Key older web-only builds saved under. Read only when the canonical key is absent.
pub const LEGACY_KEY: &str = "logisarchiv_docs";

pub struct FlatDocumentStore<K> {
    kv: K,
    key: String,
    legacy_key: Option<String>,
}

impl<K: KeyValueStore> FlatDocumentStore<K> {
    /// A store on the canonical key with the legacy key as read fallback.
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            key: CANONICAL_KEY.to_string(),
            legacy_key: Some(LEGACY_KEY.to_string()),
        }
    }

    /// A store on a custom key with no legacy fallback.
    pub fn with_key(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            legacy_key: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn inner(&self) -> &K {
        &self.kv
    }

    async fn read_blob(&self) -> PortResult<Option<(String, &str)>> {
        if let Some(blob) = self.kv.get(&self.key).await? {
            return Ok(Some((blob, self.key.as_str())));
        }
        match &self.legacy_key {
            Some(legacy) => {
                let blob = self.kv.get(legacy).await?;
                if blob.is_some() {
                    info!(
                        "Flat store key '{}' empty, reading legacy key '{}'",
                        self.key, legacy
                    );
                }
                Ok(blob.map(|b| (b, legacy.as_str())))
            }
            None => Ok(None),
        }
    }

    /// Copies an unparsable blob aside so the next save cannot destroy it.
    async fn quarantine(&self, key: &str, blob: &str) -> String {
        let target = corrupt_key(key);
        match self.kv.set(&target, blob).await {
            Ok(()) => {
                warn!("Preserved unreadable flat blob '{}' as '{}'", key, target);
                format!("preserved as '{}'", target)
            }
            Err(e) => {
                error!("Could not preserve unreadable flat blob '{}': {}", key, e);
                "not preserved".to_string()
            }
        }
    }
}

/// Key an unreadable blob is copied to, e.g. `vaulty_docs.corrupt-20240514T083000.123Z`.
pub fn corrupt_key(key: &str) -> String {
    format!("{}.corrupt-{}", key, Utc::now().format("%Y%m%dT%H%M%S%.3fZ"))
}

#[async_trait]
impl<K: KeyValueStore> DocumentStore for FlatDocumentStore<K> {
    fn kind(&self) -> BackendKind {
        BackendKind::Flat
    }

    async fn load_all(&self) -> PortResult<Collection> {
        let Some((blob, key)) = self
            .read_blob()
            .await
            .map_err(|e| PortError::StorageUnavailable(e.to_string()))?
        else {
            debug!("Flat store holds no documents");
            return Ok(Collection::new());
        };

        let collection: Collection = match serde_json::from_str(&blob) {
            Ok(collection) => collection,
            Err(e) => {
                let preserved = self.quarantine(key, &blob).await;
                return Err(PortError::StorageUnavailable(format!(
                    "Unreadable blob under key '{}' ({}): {}",
                    key, preserved, e
                )));
            }
        };
        debug!("Loaded {} documents from flat key '{}'", collection.len(), key);
        Ok(collection)
    }

    async fn replace_all(&self, collection: &Collection) -> PortResult<()> {
        let blob =
            serde_json::to_string(collection).map_err(|e| PortError::WriteFailed(e.to_string()))?;
        self.kv
            .set(&self.key, &blob)
            .await
            .map_err(|e| match e {
                PortError::WriteFailed(_) => e,
                other => PortError::WriteFailed(other.to_string()),
            })
    }
}
