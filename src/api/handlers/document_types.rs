//! Document type endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{document_type_for, require_permission};
use crate::api::auth::AuthUser;
use crate::api::pagination::{Page, PaginationQueryParams};
use crate::core::documents::DocumentType;
use crate::core::error::{Error, Result};
use crate::core::types::DocumentTypeId;
use crate::core::AppState;
use crate::security::{ObjectRef, Permission};
use crate::system::metrics::Metrics;

/// Request body for create, update and partial update
#[derive(Debug, Default, Deserialize)]
pub struct DocumentTypePayload {
    /// New label
    pub label: Option<String>,
}

/// Document type as returned by the API
#[derive(Debug, Serialize)]
pub struct DocumentTypeResponse {
    /// The document type
    #[serde(flatten)]
    pub document_type: DocumentType,
    /// Number of documents of this type, trashed included
    pub documents_count: usize,
}

impl DocumentTypeResponse {
    fn new(state: &AppState, document_type: DocumentType) -> Self {
        let documents_count = state.catalog.document_count_of_type(document_type.id);
        Self {
            document_type,
            documents_count,
        }
    }
}

fn required_label(payload: DocumentTypePayload) -> Result<String> {
    payload
        .label
        .ok_or_else(|| Error::validation("label", "This field is required."))
}

/// `GET /document_types/`, filtered to the types the caller may view
pub async fn list_document_types(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(pagination): Query<PaginationQueryParams>,
) -> Result<Json<Page<DocumentTypeResponse>>> {
    let visible: Vec<DocumentTypeResponse> = state
        .catalog
        .document_types()
        .into_iter()
        .filter(|t| {
            state.acl.has_access(
                &user,
                Permission::DocumentTypeView,
                ObjectRef::DocumentType(t.id),
                &[],
            )
        })
        .map(|t| DocumentTypeResponse::new(&state, t))
        .collect();

    Ok(Json(pagination.paginate(visible, &state.config.api)?))
}

/// `POST /document_types/`
pub async fn create_document_type(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<DocumentTypePayload>,
) -> Result<(StatusCode, Json<DocumentTypeResponse>)> {
    require_permission(&state, &user, Permission::DocumentTypeCreate)?;

    let document_type = state.catalog.create_document_type(&required_label(payload)?)?;
    Metrics::global().api.document_types_created.inc();
    info!(
        id = %document_type.id,
        label = %document_type.label,
        user = %user.username,
        "document type created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DocumentTypeResponse::new(&state, document_type)),
    ))
}

/// `GET /document_types/{id}/`
pub async fn get_document_type(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentTypeId>,
) -> Result<Json<DocumentTypeResponse>> {
    let document_type = document_type_for(&state, &user, id, Permission::DocumentTypeView)?;
    Ok(Json(DocumentTypeResponse::new(&state, document_type)))
}

/// `PUT /document_types/{id}/`
pub async fn update_document_type(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentTypeId>,
    Json(payload): Json<DocumentTypePayload>,
) -> Result<Json<DocumentTypeResponse>> {
    document_type_for(&state, &user, id, Permission::DocumentTypeEdit)?;
    let document_type = state
        .catalog
        .update_document_type(id, &required_label(payload)?)?;
    Ok(Json(DocumentTypeResponse::new(&state, document_type)))
}

/// `PATCH /document_types/{id}/`
pub async fn patch_document_type(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentTypeId>,
    Json(payload): Json<DocumentTypePayload>,
) -> Result<Json<DocumentTypeResponse>> {
    let current = document_type_for(&state, &user, id, Permission::DocumentTypeEdit)?;
    let document_type = match payload.label {
        Some(label) => state.catalog.update_document_type(id, &label)?,
        None => current,
    };
    Ok(Json(DocumentTypeResponse::new(&state, document_type)))
}

/// `DELETE /document_types/{id}/`, removing its documents as well
pub async fn delete_document_type(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentTypeId>,
) -> Result<StatusCode> {
    document_type_for(&state, &user, id, Permission::DocumentTypeDelete)?;

    let removal = state.catalog.delete_document_type(id)?;
    state.discard(&removal);
    state.acl.forget(ObjectRef::DocumentType(id));
    info!(
        id = %id,
        documents = removal.documents.len(),
        user = %user.username,
        "document type deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
