//! services/archive/src/adapters/file_kv.rs
//!
//! A file-backed implementation of the `KeyValueStore` port. Each key is one
//! `<key>.json` file in a directory; writes go to a temporary file first and are
//! renamed into place, so a crash mid-write never leaves a truncated blob.

use archive_core::ports::{KeyValueStore, PortError, PortResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A key/value adapter that stores each value as a file under `dir`.
#[derive(Clone, Debug)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a new `FileKeyValueStore`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::StorageUnavailable(format!(
                "Failed to read key '{}': {}",
                key, e
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let write_err = |e: std::io::Error| {
            PortError::WriteFailed(format!("Failed to write key '{}': {}", key, e))
        };

        fs::create_dir_all(&self.dir).await.map_err(write_err)?;
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&staging, value).await.map_err(write_err)?;
        fs::rename(&staging, &target).await.map_err(write_err)?;
        Ok(())
    }
}
