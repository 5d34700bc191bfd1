//! services/archive/src/adapters/sqlite.rs
//!
//! This module contains the structured storage adapter, the concrete implementation
//! of the `DocumentStore` port backed by SQLite through `sqlx`. Each row holds one
//! serialized document; a save clears the table and re-inserts the collection.

use archive_core::domain::{Collection, Document};
use archive_core::ports::{BackendKind, DocumentStore, PortError, PortResult};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const MAX_CONNECTIONS: u32 = 5;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Creates a new `SqliteDocumentStore` over an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url`, creating the database file if needed.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        Self::connect_with(options).await
    }

    /// Connects to the database file at `path`, creating it if needed.
    pub async fn connect_path(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    id: i64,
    content: String,
}
impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        serde_json::from_str(&self.content).map_err(|e| {
            PortError::StorageUnavailable(format!("Malformed document in row {}: {}", self.id, e))
        })
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Structured
    }

    async fn load_all(&self) -> PortResult<Collection> {
        // Rows are rewritten in collection order on every save.
        let records = sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, content FROM documents ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::StorageUnavailable(e.to_string()))?;

        let documents = records
            .into_iter()
            .map(|r| r.to_domain())
            .collect::<PortResult<Vec<Document>>>()?;
        debug!("Loaded {} documents from SQLite", documents.len());
        Ok(Collection::from_documents(documents))
    }

    async fn replace_all(&self, collection: &Collection) -> PortResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::WriteFailed(e.to_string()))?;

        sqlx::query("DELETE FROM documents")
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::WriteFailed(e.to_string()))?;

        for doc in collection {
            let content =
                serde_json::to_string(doc).map_err(|e| PortError::WriteFailed(e.to_string()))?;
            sqlx::query("INSERT INTO documents (type, content) VALUES (?, ?)")
                .bind(doc.category.label())
                .bind(content)
                .execute(&mut *tx)
                .await
                .map_err(|e| PortError::WriteFailed(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::WriteFailed(e.to_string()))?;
        debug!("Replaced SQLite contents with {} documents", collection.len());
        Ok(())
    }
}
