//! Integration tests for the concrete storage adapters: SQLite structured store,
//! file-backed key/value store, and the engine running on both.

mod common;

use std::sync::Arc;

use archive_core::flat::{CANONICAL_KEY, LEGACY_KEY};
use archive_core::{
    Archive, Category, DocumentStore, FlatDocumentStore, KeyValueStore, LoadSource, PortError,
    PrimaryBackend, StorageBackends,
};
use archive_lib::adapters::{FileKeyValueStore, SqliteDocumentStore};
use common::{collection, doc, ids_of, sqlite_store};
use tempfile::tempdir;

// ============================================================================
// SQLite
// ============================================================================

#[tokio::test]
async fn sqlite_round_trip_preserves_order() {
    let dir = tempdir().unwrap();
    let store = sqlite_store(dir.path()).await;

    let c = collection(&["c", "b", "a"]);
    store.replace_all(&c).await.unwrap();

    let loaded = store.load_all().await.unwrap();
    assert_eq!(loaded, c);
    assert_eq!(ids_of(&loaded), vec!["c", "b", "a"]);
}

#[tokio::test]
async fn sqlite_replace_all_overwrites_previous_rows() {
    let dir = tempdir().unwrap();
    let store = sqlite_store(dir.path()).await;

    store.replace_all(&collection(&["a", "b", "c"])).await.unwrap();
    store.replace_all(&collection(&["d", "a"])).await.unwrap();

    assert_eq!(ids_of(&store.load_all().await.unwrap()), vec!["d", "a"]);
}

#[tokio::test]
async fn sqlite_stores_category_label_in_type_column() {
    let dir = tempdir().unwrap();
    let store = sqlite_store(dir.path()).await;
    let c = archive_core::Collection::from_documents(vec![doc("inv", Category::Invoice)]);
    store.replace_all(&c).await.unwrap();

    let label: (String,) = sqlx::query_as("SELECT type FROM documents")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(label.0, "Facture");
}

#[tokio::test]
async fn sqlite_without_schema_is_unavailable() {
    let dir = tempdir().unwrap();
    let store = SqliteDocumentStore::connect_path(&dir.path().join("bare.db"))
        .await
        .unwrap();

    assert!(matches!(
        store.load_all().await,
        Err(PortError::StorageUnavailable(_))
    ));
    assert!(matches!(
        store.replace_all(&collection(&["a"])).await,
        Err(PortError::WriteFailed(_))
    ));
}

#[tokio::test]
async fn sqlite_malformed_row_is_unavailable() {
    let dir = tempdir().unwrap();
    let store = sqlite_store(dir.path()).await;
    sqlx::query("INSERT INTO documents (type, content) VALUES ('Autre', '{\"id\": 1')")
        .execute(store.pool())
        .await
        .unwrap();

    assert!(matches!(
        store.load_all().await,
        Err(PortError::StorageUnavailable(_))
    ));
}

// ============================================================================
// File key/value store
// ============================================================================

#[tokio::test]
async fn file_kv_missing_key_is_none() {
    let dir = tempdir().unwrap();
    let kv = FileKeyValueStore::new(dir.path().join("flat"));
    assert_eq!(kv.get(CANONICAL_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn file_kv_set_creates_directory_and_overwrites() {
    let dir = tempdir().unwrap();
    let kv = FileKeyValueStore::new(dir.path().join("nested").join("flat"));

    kv.set("k", "first").await.unwrap();
    kv.set("k", "second").await.unwrap();

    assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("second"));
    assert!(kv.dir().join("k.json").exists());
    assert!(!kv.dir().join(".k.json.tmp").exists());
}

#[tokio::test]
async fn flat_store_on_files_migrates_legacy_key() {
    let dir = tempdir().unwrap();
    let kv = FileKeyValueStore::new(dir.path());
    kv.set(LEGACY_KEY, &serde_json::to_string(&collection(&["w"])).unwrap())
        .await
        .unwrap();

    let flat = FlatDocumentStore::new(kv.clone());
    let loaded = flat.load_all().await.unwrap();
    assert_eq!(ids_of(&loaded), vec!["w"]);

    flat.replace_all(&loaded).await.unwrap();
    assert!(kv.get(CANONICAL_KEY).await.unwrap().is_some());
}

// ============================================================================
// Engine on real adapters
// ============================================================================

#[tokio::test]
async fn document_survives_restart_on_sqlite_and_files() {
    let dir = tempdir().unwrap();
    let flat_dir = dir.path().join("flat");

    {
        let backends = StorageBackends::with_structured(
            sqlite_store(dir.path()).await,
            Arc::new(FlatDocumentStore::new(FileKeyValueStore::new(&flat_dir))),
        );
        let mut archive = Archive::initialize(backends).await;
        let report = archive.add_document(doc("d1", Category::Contract)).await;
        assert!(report.is_clean());
    }

    let backends = StorageBackends::with_structured(
        sqlite_store(dir.path()).await,
        Arc::new(FlatDocumentStore::new(FileKeyValueStore::new(&flat_dir))),
    );
    let archive = Archive::initialize(backends).await;
    assert_eq!(ids_of(archive.collection()), vec!["d1"]);
    assert_eq!(archive.engine().load_source(), LoadSource::Structured);
    assert_eq!(archive.engine().primary(), PrimaryBackend::Structured);
}

#[tokio::test]
async fn broken_sqlite_falls_back_to_file_mirror() {
    let dir = tempdir().unwrap();
    let kv = FileKeyValueStore::new(dir.path().join("flat"));
    kv.set(CANONICAL_KEY, &serde_json::to_string(&collection(&["m1", "m2"])).unwrap())
        .await
        .unwrap();

    // No migrations: every query fails.
    let bare = SqliteDocumentStore::connect_path(&dir.path().join("bare.db"))
        .await
        .unwrap();
    let backends = StorageBackends::with_structured(
        Arc::new(bare),
        Arc::new(FlatDocumentStore::new(kv)),
    );

    let archive = Archive::initialize(backends).await;
    assert_eq!(ids_of(archive.collection()), vec!["m1", "m2"]);
    assert_eq!(archive.engine().load_source(), LoadSource::Flat);
}
