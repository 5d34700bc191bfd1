pub mod file_kv;
pub mod sqlite;

pub use file_kv::FileKeyValueStore;
pub use sqlite::SqliteDocumentStore;
