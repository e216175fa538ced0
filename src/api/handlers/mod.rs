//! HTTP request handlers for the Docvault API
//!
//! Object lookups go through the helpers below so that a missing object and
//! an object the caller may not see produce the same 404.

pub mod acls;
pub mod document_files;
pub mod document_types;
pub mod documents;
pub mod system;

use crate::core::documents::{Document, DocumentFile, DocumentType};
use crate::core::error::{Error, Result};
use crate::core::types::{DocumentFileId, DocumentId, DocumentTypeId};
use crate::core::AppState;
use crate::security::{AccessMode, ObjectRef, Permission, User};
use crate::system::metrics::Metrics;

/// Run an access check, counting denials
pub(crate) fn require_access(
    state: &AppState,
    user: &User,
    permission: Permission,
    object: ObjectRef,
    parents: &[ObjectRef],
    mode: AccessMode,
) -> Result<()> {
    state
        .acl
        .check_access(user, permission, object, parents, mode)
        .inspect_err(|_| Metrics::global().api.access_denied.inc())
}

/// Run a global permission check, counting denials
pub(crate) fn require_permission(
    state: &AppState,
    user: &User,
    permission: Permission,
) -> Result<()> {
    state
        .acl
        .check_permission(user, permission)
        .inspect_err(|_| Metrics::global().api.access_denied.inc())
}

/// Load a document type the caller holds `permission` on
pub(crate) fn document_type_for(
    state: &AppState,
    user: &User,
    id: DocumentTypeId,
    permission: Permission,
) -> Result<DocumentType> {
    let document_type = state
        .catalog
        .document_type(id)
        .ok_or_else(|| Error::not_found(format!("document type {}", id)))?;
    require_access(
        state,
        user,
        permission,
        ObjectRef::DocumentType(id),
        &[],
        AccessMode::Hide,
    )?;
    Ok(document_type)
}

/// Load a live or trashed document without checking access
pub(crate) fn existing_document(
    state: &AppState,
    id: DocumentId,
    trashed: bool,
) -> Result<Document> {
    state
        .catalog
        .document(id)
        .filter(|document| document.in_trash == trashed)
        .ok_or_else(|| Error::not_found(format!("document {}", id)))
}

/// Load a document the caller holds `permission` on
///
/// `trashed` selects between the live and the trash endpoints; a document
/// in the other state is reported as missing.
pub(crate) fn document_for(
    state: &AppState,
    user: &User,
    id: DocumentId,
    permission: Permission,
    trashed: bool,
    mode: AccessMode,
) -> Result<Document> {
    let document = existing_document(state, id, trashed)?;
    require_access(
        state,
        user,
        permission,
        document.object_ref(),
        &document.acl_parents(),
        mode,
    )?;
    Ok(document)
}

/// Load a file of a live document the caller holds `permission` on
///
/// Files carry no grants of their own; they are checked against their
/// document and its type.
pub(crate) fn file_for(
    state: &AppState,
    user: &User,
    document_id: DocumentId,
    file_id: DocumentFileId,
    permission: Permission,
) -> Result<(Document, DocumentFile)> {
    let document = document_for(state, user, document_id, permission, false, AccessMode::Hide)?;
    let file = state
        .catalog
        .file(document.id, file_id)
        .ok_or_else(|| Error::not_found(format!("document file {}", file_id)))?;
    Ok((document, file))
}
