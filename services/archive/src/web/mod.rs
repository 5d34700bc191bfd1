pub mod rest;
pub mod state;

// Re-export the handlers so the binary can build the router from one place.
pub use rest::{
    add_document_handler, delete_document_handler, export_handler, import_handler,
    list_documents_handler,
};
pub use state::{build_backends, AppState};
