//! services/archive/src/web/rest.rs
//!
//! Contains the Axum handlers for the archive's REST API and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use archive_core::domain::{BackupBundle, Collection, Document, DocumentId};
use archive_core::ports::FixedDecision;
use archive_core::sync::PersistReport;
use archive_core::{DeleteOutcome, ImportOutcome};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_documents_handler,
        add_document_handler,
        delete_document_handler,
        export_handler,
        import_handler,
    ),
    components(
        schemas(CollectionResponse, ImportResponse)
    ),
    tags(
        (name = "Document Archive API", description = "Local-first archive of logistics documents.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The live collection, returned after every read or mutation.
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionResponse {
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub documents: Collection,
    /// Stores that did not accept the last write. The change is kept in memory.
    pub storage_warnings: Vec<String>,
}

impl CollectionResponse {
    fn new(collection: &Collection, report: Option<&PersistReport>) -> Self {
        Self {
            count: collection.len(),
            documents: collection.clone(),
            storage_warnings: report.map(storage_warnings).unwrap_or_default(),
        }
    }
}

fn storage_warnings(report: &PersistReport) -> Vec<String> {
    report
        .failures
        .iter()
        .map(|f| format!("{} store: {}", f.backend, f.error))
        .collect()
}

/// Summary of a completed import.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImportResponse {
    pub incoming: usize,
    pub total: usize,
    pub storage_warnings: Vec<String>,
}

/// Destructive endpoints only proceed with `?confirm=true`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every archived document, newest first.
#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "The live collection", body = CollectionResponse)
    )
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<CollectionResponse> {
    let archive = app_state.archive.lock().await;
    Json(CollectionResponse::new(archive.collection(), None))
}

/// Archive a fully processed document.
///
/// The document is prepended; a document with the same id is replaced.
#[utoipa::path(
    post,
    path = "/documents",
    request_body(content = String, description = "A processed document record.", content_type = "application/json"),
    responses(
        (status = 201, description = "Document archived", body = CollectionResponse),
        (status = 422, description = "Body is not a valid document")
    )
)]
pub async fn add_document_handler(
    State(app_state): State<Arc<AppState>>,
    Json(document): Json<Document>,
) -> (StatusCode, Json<CollectionResponse>) {
    let mut archive = app_state.archive.lock().await;
    info!("Archiving document {}", document.id);
    let report = archive.add_document(document).await;
    (
        StatusCode::CREATED,
        Json(CollectionResponse::new(archive.collection(), Some(&report))),
    )
}

/// Delete a document by id.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(
        ("id" = String, Path, description = "The document id."),
        ConfirmParams
    ),
    responses(
        (status = 200, description = "Document deleted", body = CollectionResponse),
        (status = 404, description = "No document with this id"),
        (status = 409, description = "Deletion was not confirmed")
    )
)]
pub async fn delete_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> ApiResult<Json<CollectionResponse>> {
    let id = DocumentId::from(id);
    let mut archive = app_state.archive.lock().await;
    let outcome = archive
        .delete_document(&id, &FixedDecision::from_flag(params.confirm))
        .await;
    match outcome {
        DeleteOutcome::Deleted(report) => Ok(Json(CollectionResponse::new(
            archive.collection(),
            Some(&report),
        ))),
        DeleteOutcome::NotFound => Err((
            StatusCode::NOT_FOUND,
            format!("Document {} not found", id),
        )),
        DeleteOutcome::Cancelled => Err((
            StatusCode::CONFLICT,
            "Deletion requires confirm=true".to_string(),
        )),
    }
}

/// Download the whole archive as a backup bundle.
#[utoipa::path(
    get,
    path = "/export",
    responses(
        (status = 200, description = "Backup bundle, sent as a file attachment")
    )
)]
pub async fn export_handler(
    State(app_state): State<Arc<AppState>>,
) -> ([(header::HeaderName, String); 1], Json<BackupBundle>) {
    let bundle = app_state.archive.lock().await.export_bundle();
    let disposition = format!("attachment; filename=\"{}\"", bundle.file_name());
    ([(header::CONTENT_DISPOSITION, disposition)], Json(bundle))
}

/// Merge a backup file into the archive.
///
/// The body is the raw text of the backup file. Documents in the backup win
/// over live documents with the same id.
#[utoipa::path(
    post,
    path = "/import",
    request_body(content = String, description = "Backup file contents", content_type = "application/json"),
    params(ConfirmParams),
    responses(
        (status = 200, description = "Backup merged", body = ImportResponse),
        (status = 400, description = "Backup file is malformed; nothing was changed"),
        (status = 409, description = "Import was not confirmed")
    )
)]
pub async fn import_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ConfirmParams>,
    body: String,
) -> ApiResult<Json<ImportResponse>> {
    let mut archive = app_state.archive.lock().await;
    let outcome = archive
        .import_bundle(&body, &FixedDecision::from_flag(params.confirm))
        .await
        .map_err(|e| {
            warn!("Rejected backup import: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;

    match outcome {
        ImportOutcome::Imported {
            incoming,
            total,
            report,
        } => Ok(Json(ImportResponse {
            incoming,
            total,
            storage_warnings: storage_warnings(&report),
        })),
        ImportOutcome::Cancelled => Err((
            StatusCode::CONFLICT,
            "Import requires confirm=true".to_string(),
        )),
    }
}
