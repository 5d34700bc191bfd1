//! Shared mock ports and document builders for the archive_core test suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use archive_core::{
    BackendKind, Category, Collection, ConfirmRequest, ConfirmationService, Document, DocumentId,
    DocumentMetadata, DocumentStore, FlatDocumentStore, Intent, KeyValueStore, PortError,
    PortResult, StorageBackends,
};

// ============================================================================
// Documents
// ============================================================================

pub fn doc(id: &str) -> Document {
    doc_named(id, &format!("{id}.pdf"))
}

pub fn doc_named(id: &str, file_name: &str) -> Document {
    Document {
        id: DocumentId::from(id),
        file_name: file_name.to_string(),
        file_type: "application/pdf".to_string(),
        binary_payload: "JVBERi0xLjQ=".to_string(),
        upload_date: Utc.with_ymd_and_hms(2024, 5, 14, 8, 30, 0).unwrap(),
        category: Category::Invoice,
        metadata: DocumentMetadata::new()
            .with("id", format!("meta-{id}"))
            .with("date", "2024-05-13")
            .with("companyName", "Transports Martin")
            .with("amount", "1250.00 EUR")
            .with("documentReference", format!("FAC-{id}"))
            .with("summary", "Freight invoice")
            .with("language", "fr"),
        full_text: "FACTURE".to_string(),
        is_duplicate: false,
        duplicate_of_id: None,
    }
}

pub fn collection(ids: &[&str]) -> Collection {
    Collection::from_documents(ids.iter().map(|id| doc(id)))
}

pub fn ids_of(collection: &Collection) -> Vec<String> {
    collection.iter().map(|d| d.id.to_string()).collect()
}

// ============================================================================
// Mock Key/Value Store
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.put(key, value);
        Ok(())
    }
}

/// Reads like an empty store; every write is refused.
#[derive(Default)]
pub struct ReadOnlyKv;

#[async_trait]
impl KeyValueStore for ReadOnlyKv {
    async fn get(&self, _key: &str) -> PortResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> PortResult<()> {
        Err(PortError::WriteFailed("disk full".into()))
    }
}

// ============================================================================
// Mock Structured Store
// ============================================================================

/// An in-memory structured store whose reads and writes can be made to fail.
#[derive(Default)]
pub struct MockStructured {
    rows: Mutex<Collection>,
    fail_load: AtomicBool,
    fail_write: AtomicBool,
    writes: AtomicUsize,
}

impl MockStructured {
    pub fn failing_load() -> Self {
        let store = Self::default();
        store.fail_load.store(true, Ordering::SeqCst);
        store
    }

    pub fn failing_write() -> Self {
        let store = Self::default();
        store.fail_write.store(true, Ordering::SeqCst);
        store
    }

    pub fn with_rows(rows: Collection) -> Self {
        let store = Self::default();
        *store.rows.lock().unwrap() = rows;
        store
    }

    pub fn rows(&self) -> Collection {
        self.rows.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MockStructured {
    fn kind(&self) -> BackendKind {
        BackendKind::Structured
    }

    async fn load_all(&self) -> PortResult<Collection> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(PortError::StorageUnavailable("no such table: documents".into()));
        }
        Ok(self.rows())
    }

    async fn replace_all(&self, collection: &Collection) -> PortResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(PortError::WriteFailed("database is locked".into()));
        }
        *self.rows.lock().unwrap() = collection.clone();
        Ok(())
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub fn flat_store(kv: &MemoryKv) -> Arc<dyn DocumentStore> {
    Arc::new(FlatDocumentStore::new(kv.clone()))
}

pub fn backends(structured: &Arc<MockStructured>, kv: &MemoryKv) -> StorageBackends {
    StorageBackends::with_structured(structured.clone(), flat_store(kv))
}

/// Answers every request with `Cancel` and remembers what it was asked.
#[derive(Default)]
pub struct Refuse {
    pub asked: Mutex<Vec<ConfirmRequest>>,
}

#[async_trait]
impl ConfirmationService for Refuse {
    async fn confirm(&self, request: &ConfirmRequest) -> Intent {
        self.asked.lock().unwrap().push(request.clone());
        Intent::Cancel
    }
}
