//! Document and trash endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::{document_for, require_access};
use crate::api::auth::AuthUser;
use crate::api::handlers::document_files::{accept_upload, UploadAccepted};
use crate::api::pagination::{Page, PaginationQueryParams};
use crate::core::documents::{Document, DocumentFile};
use crate::core::error::{Error, Result};
use crate::core::types::{DocumentId, DocumentTypeId};
use crate::core::AppState;
use crate::ingest::Upload;
use crate::security::{AccessMode, ObjectRef, Permission, User};
use crate::storage::{DocumentChanges, NewDocument};
use crate::system::metrics::Metrics;

/// Request body for `POST /documents/`
#[derive(Debug, Deserialize)]
pub struct CreateDocumentPayload {
    /// Type of the new document
    pub document_type_id: DocumentTypeId,
    /// Display label
    pub label: String,
    /// Free text description
    #[serde(default)]
    pub description: Option<String>,
    /// ISO 639-3 language code
    #[serde(default)]
    pub language: Option<String>,
}

/// Request body for document updates
#[derive(Debug, Default, Deserialize)]
pub struct DocumentPayload {
    /// New label
    pub label: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New language code
    pub language: Option<String>,
}

/// Query of `POST /documents/upload/`
#[derive(Debug, Deserialize)]
pub struct DocumentUploadParams {
    /// Type of the new document
    pub document_type_id: DocumentTypeId,
    /// Name of the uploaded file, also used as the document label
    pub filename: Option<String>,
    /// Comment stored on the file
    pub comment: Option<String>,
}

/// Document as returned by the API
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// The document
    #[serde(flatten)]
    pub document: Document,
    /// Newest file, if any
    pub file_latest: Option<DocumentFile>,
    /// Number of files
    pub files_count: usize,
    /// Pages of the newest file
    pub page_count: u32,
}

impl DocumentResponse {
    pub(crate) fn new(state: &AppState, document: Document) -> Self {
        let files = state.catalog.files_of(document.id);
        let file_latest = files.last().cloned();
        Self {
            page_count: file_latest.as_ref().map_or(0, |f| f.page_count),
            files_count: files.len(),
            file_latest,
            document,
        }
    }
}

fn visible_documents(
    state: &AppState,
    user: &User,
    permission: Permission,
    trashed: bool,
) -> Vec<DocumentResponse> {
    state
        .catalog
        .documents()
        .into_iter()
        .filter(|d| d.in_trash == trashed)
        .filter(|d| state.acl.has_access(user, permission, d.object_ref(), &d.acl_parents()))
        .map(|d| DocumentResponse::new(state, d))
        .collect()
}

/// Require `document_create` on an existing document type
fn require_create_on_type(state: &AppState, user: &User, id: DocumentTypeId) -> Result<()> {
    if state.catalog.document_type(id).is_none() {
        return Err(Error::validation(
            "document_type_id",
            format!("Invalid pk \"{}\" - object does not exist.", id),
        ));
    }
    require_access(
        state,
        user,
        Permission::DocumentCreate,
        ObjectRef::DocumentType(id),
        &[],
        AccessMode::Forbid,
    )
}

/// `GET /documents/`
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(pagination): Query<PaginationQueryParams>,
) -> Result<Json<Page<DocumentResponse>>> {
    let documents = visible_documents(&state, &user, Permission::DocumentView, false);
    Ok(Json(pagination.paginate(documents, &state.config.api)?))
}

/// `POST /documents/`
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateDocumentPayload>,
) -> Result<(StatusCode, Json<DocumentResponse>)> {
    require_create_on_type(&state, &user, payload.document_type_id)?;

    let document = state.catalog.create_document(NewDocument {
        document_type_id: payload.document_type_id,
        label: payload.label,
        description: payload.description,
        language: payload.language,
    })?;
    Metrics::global().api.documents_created.inc();
    info!(id = %document.id, user = %user.username, "document created");

    Ok((StatusCode::CREATED, Json(DocumentResponse::new(&state, document))))
}

/// `POST /documents/upload/`: create a document from a file in one call
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<DocumentUploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadAccepted>)> {
    require_create_on_type(&state, &user, params.document_type_id)?;
    let filename = params
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| Error::validation("filename", "This field is required."))?;

    let document = state.catalog.create_document(NewDocument {
        document_type_id: params.document_type_id,
        label: filename.clone(),
        description: None,
        language: None,
    })?;

    let upload = Upload {
        filename,
        comment: params.comment.unwrap_or_default(),
        content: body,
    };
    match accept_upload(&state, &document, upload).await {
        Ok(accepted) => {
            Metrics::global().api.documents_created.inc();
            Ok((StatusCode::ACCEPTED, Json(accepted)))
        }
        Err(e) => {
            // The document only exists to hold this file
            warn!(id = %document.id, error = %e, "upload failed, removing its document");
            if let Ok(removal) = state.catalog.delete_document(document.id) {
                state.discard(&removal);
            }
            Err(e)
        }
    }
}

/// `GET /documents/{id}/`
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
) -> Result<Json<DocumentResponse>> {
    let document =
        document_for(&state, &user, id, Permission::DocumentView, false, AccessMode::Hide)?;
    Ok(Json(DocumentResponse::new(&state, document)))
}

/// `PUT /documents/{id}/`
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
    Json(payload): Json<DocumentPayload>,
) -> Result<Json<DocumentResponse>> {
    if payload.label.is_none() {
        return Err(Error::validation("label", "This field is required."));
    }
    edit_document(&state, &user, id, payload)
}

/// `PATCH /documents/{id}/`
pub async fn patch_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
    Json(payload): Json<DocumentPayload>,
) -> Result<Json<DocumentResponse>> {
    edit_document(&state, &user, id, payload)
}

fn edit_document(
    state: &AppState,
    user: &User,
    id: DocumentId,
    payload: DocumentPayload,
) -> Result<Json<DocumentResponse>> {
    document_for(state, user, id, Permission::DocumentPropertiesEdit, false, AccessMode::Hide)?;
    let document = state.catalog.update_document(
        id,
        DocumentChanges {
            label: payload.label,
            description: payload.description,
            language: payload.language,
        },
    )?;
    Ok(Json(DocumentResponse::new(state, document)))
}

/// `DELETE /documents/{id}/`: moves the document to the trash
pub async fn trash_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
) -> Result<StatusCode> {
    document_for(&state, &user, id, Permission::DocumentTrash, false, AccessMode::Hide)?;
    state.catalog.set_trashed(id, true)?;
    info!(id = %id, user = %user.username, "document moved to trash");
    Ok(StatusCode::ACCEPTED)
}

/// `GET /trashed_documents/`
pub async fn list_trashed_documents(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(pagination): Query<PaginationQueryParams>,
) -> Result<Json<Page<DocumentResponse>>> {
    let documents = visible_documents(&state, &user, Permission::TrashedDocumentView, true);
    Ok(Json(pagination.paginate(documents, &state.config.api)?))
}

/// `GET /trashed_documents/{id}/`
pub async fn get_trashed_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
) -> Result<Json<DocumentResponse>> {
    let document = document_for(
        &state,
        &user,
        id,
        Permission::TrashedDocumentView,
        true,
        AccessMode::Hide,
    )?;
    Ok(Json(DocumentResponse::new(&state, document)))
}

/// `POST /trashed_documents/{id}/restore/`
pub async fn restore_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
) -> Result<Json<DocumentResponse>> {
    document_for(
        &state,
        &user,
        id,
        Permission::TrashedDocumentRestore,
        true,
        AccessMode::Hide,
    )?;
    let document = state.catalog.set_trashed(id, false)?;
    info!(id = %id, user = %user.username, "document restored");
    Ok(Json(DocumentResponse::new(&state, document)))
}

/// `DELETE /trashed_documents/{id}/`: deletes the document for good
pub async fn delete_trashed_document(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
) -> Result<StatusCode> {
    document_for(
        &state,
        &user,
        id,
        Permission::TrashedDocumentDelete,
        true,
        AccessMode::Hide,
    )?;
    let removal = state.catalog.delete_document(id)?;
    state.discard(&removal);
    info!(id = %id, files = removal.storage_keys.len(), user = %user.username, "document deleted");
    Ok(StatusCode::NO_CONTENT)
}
