//! Helpers shared by the archive service integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use archive_core::{Category, Collection, Document, DocumentId, DocumentMetadata};
use archive_lib::adapters::SqliteDocumentStore;
use chrono::{TimeZone, Utc};

pub fn doc(id: &str, category: Category) -> Document {
    Document {
        id: DocumentId::from(id),
        file_name: format!("{id}.jpg"),
        file_type: "image/jpeg".to_string(),
        binary_payload: "/9j/4AAQSkZJRg==".to_string(),
        upload_date: Utc.with_ymd_and_hms(2024, 9, 2, 14, 0, 0).unwrap(),
        category,
        metadata: DocumentMetadata::new()
            .with("id", format!("meta-{id}"))
            .with("date", "2024-09-01")
            .with("companyName", "Logistique Atlas")
            .with("documentReference", format!("BL-{id}"))
            .with("summary", "Pallet delivery")
            .with("language", "fr"),
        full_text: "BON DE LIVRAISON".to_string(),
        is_duplicate: false,
        duplicate_of_id: None,
    }
}

pub fn collection(ids: &[&str]) -> Collection {
    Collection::from_documents(ids.iter().map(|id| doc(id, Category::DeliveryNote)))
}

pub fn ids_of(collection: &Collection) -> Vec<String> {
    collection.iter().map(|d| d.id.to_string()).collect()
}

/// Opens a migrated SQLite store in `dir`.
pub async fn sqlite_store(dir: &Path) -> Arc<SqliteDocumentStore> {
    let store = SqliteDocumentStore::connect_path(&dir.join("archive.db"))
        .await
        .expect("open sqlite");
    store.run_migrations().await.expect("run migrations");
    Arc::new(store)
}
