//! Permission catalogue and object grant endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{document_for, require_access};
use crate::api::auth::AuthUser;
use crate::api::pagination::{Page, PaginationQueryParams};
use crate::core::error::{Error, Result};
use crate::core::types::{DocumentId, DocumentTypeId, UserId};
use crate::core::AppState;
use crate::security::{AccessEntry, AccessMode, ObjectRef, Permission, User};

/// A permission as listed by `/permissions/`
#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    /// `namespace.name`
    pub pk: String,
    /// Namespace
    pub namespace: &'static str,
    /// Name within the namespace
    pub name: &'static str,
    /// Human readable label
    pub label: &'static str,
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        Self {
            pk: permission.to_string(),
            namespace: permission.namespace(),
            name: permission.name(),
            label: permission.label(),
        }
    }
}

/// Request body to grant or revoke a permission on an object
#[derive(Debug, Deserialize)]
pub struct GrantPayload {
    /// Grantee
    pub user_id: UserId,
    /// Permission, as `namespace.name`
    pub permission: Permission,
}

/// `GET /permissions/`
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Query(pagination): Query<PaginationQueryParams>,
) -> Result<Json<Page<PermissionResponse>>> {
    let permissions: Vec<PermissionResponse> = Permission::ALL
        .into_iter()
        .map(PermissionResponse::from)
        .collect();
    Ok(Json(pagination.paginate(permissions, &state.config.api)?))
}

/// Resolve a document type as an ACL target the caller holds `permission` on
fn document_type_target(
    state: &AppState,
    user: &User,
    id: DocumentTypeId,
    permission: Permission,
) -> Result<ObjectRef> {
    if state.catalog.document_type(id).is_none() {
        return Err(Error::not_found(format!("document type {}", id)));
    }
    let object = ObjectRef::DocumentType(id);
    require_access(state, user, permission, object, &[], AccessMode::Hide)?;
    Ok(object)
}

/// Resolve a live document as an ACL target the caller holds `permission` on
fn document_target(
    state: &AppState,
    user: &User,
    id: DocumentId,
    permission: Permission,
) -> Result<ObjectRef> {
    document_for(state, user, id, permission, false, AccessMode::Hide).map(|d| d.object_ref())
}

fn list_grants(
    state: &AppState,
    object: ObjectRef,
    pagination: PaginationQueryParams,
) -> Result<Json<Page<AccessEntry>>> {
    Ok(Json(pagination.paginate(state.acl.grants_for(object), &state.config.api)?))
}

fn grant(
    state: &AppState,
    user: &User,
    object: ObjectRef,
    payload: GrantPayload,
) -> Result<(StatusCode, Json<AccessEntry>)> {
    if state.users.get(payload.user_id).is_none() {
        return Err(Error::validation(
            "user_id",
            format!("Invalid pk \"{}\" - object does not exist.", payload.user_id),
        ));
    }
    state.acl.grant_access(payload.user_id, object, payload.permission);
    info!(
        %object,
        grantee = %payload.user_id,
        permission = %payload.permission,
        user = %user.username,
        "access granted"
    );

    Ok((
        StatusCode::CREATED,
        Json(AccessEntry {
            user_id: payload.user_id,
            object,
            permission: payload.permission,
        }),
    ))
}

fn revoke(state: &AppState, user: &User, object: ObjectRef, payload: GrantPayload) -> StatusCode {
    state.acl.revoke_access(payload.user_id, object, payload.permission);
    info!(
        %object,
        grantee = %payload.user_id,
        permission = %payload.permission,
        user = %user.username,
        "access revoked"
    );
    StatusCode::NO_CONTENT
}

/// `GET /document_types/{id}/acls/`
pub async fn list_document_type_acls(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentTypeId>,
    Query(pagination): Query<PaginationQueryParams>,
) -> Result<Json<Page<AccessEntry>>> {
    let object = document_type_target(&state, &user, id, Permission::AclView)?;
    list_grants(&state, object, pagination)
}

/// `POST /document_types/{id}/acls/`
pub async fn grant_document_type_access(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentTypeId>,
    Json(payload): Json<GrantPayload>,
) -> Result<(StatusCode, Json<AccessEntry>)> {
    let object = document_type_target(&state, &user, id, Permission::AclEdit)?;
    grant(&state, &user, object, payload)
}

/// `POST /document_types/{id}/acls/revoke/`
pub async fn revoke_document_type_access(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentTypeId>,
    Json(payload): Json<GrantPayload>,
) -> Result<StatusCode> {
    let object = document_type_target(&state, &user, id, Permission::AclEdit)?;
    Ok(revoke(&state, &user, object, payload))
}

/// `GET /documents/{id}/acls/`
pub async fn list_document_acls(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
    Query(pagination): Query<PaginationQueryParams>,
) -> Result<Json<Page<AccessEntry>>> {
    let object = document_target(&state, &user, id, Permission::AclView)?;
    list_grants(&state, object, pagination)
}

/// `POST /documents/{id}/acls/`
pub async fn grant_document_access(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
    Json(payload): Json<GrantPayload>,
) -> Result<(StatusCode, Json<AccessEntry>)> {
    let object = document_target(&state, &user, id, Permission::AclEdit)?;
    grant(&state, &user, object, payload)
}

/// `POST /documents/{id}/acls/revoke/`
pub async fn revoke_document_access(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<DocumentId>,
    Json(payload): Json<GrantPayload>,
) -> Result<StatusCode> {
    let object = document_target(&state, &user, id, Permission::AclEdit)?;
    Ok(revoke(&state, &user, object, payload))
}
