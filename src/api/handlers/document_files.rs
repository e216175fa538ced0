//! Document file endpoints: upload, list, detail, delete, download, pages

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{document_for, existing_document, file_for};
use crate::api::auth::AuthUser;
use crate::api::pagination::{Page, PaginationQueryParams};
use crate::core::documents::{Document, DocumentFile, DocumentFilePage};
use crate::core::error::{Error, Result, StorageError};
use crate::core::types::{DocumentFileId, DocumentFilePageId, DocumentId};
use crate::core::AppState;
use crate::ingest::inspect::checksum;
use crate::ingest::{Submission, Upload};
use crate::security::{AccessMode, Permission};
use crate::system::metrics::Metrics;

/// Query of the file upload endpoint
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Name of the uploaded file
    pub filename: Option<String>,
    /// Comment stored on the file
    pub comment: Option<String>,
}

/// Query of the download endpoint
#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    /// Keep the document label's extension at the end of the filename
    #[serde(default)]
    pub preserve_extension: bool,
}

/// Processing state of an accepted upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// The file exists
    Completed,
    /// The file is waiting for the background worker
    Queued,
}

/// Body of a 202 upload response
#[derive(Debug, Serialize)]
pub struct UploadAccepted {
    /// Receiving document
    pub document_id: DocumentId,
    /// Name supplied by the uploader
    pub filename: String,
    /// Comment supplied by the uploader
    pub comment: String,
    /// Bytes received
    pub size: u64,
    /// Processing state
    pub status: UploadStatus,
    /// The created file, once processed
    pub file: Option<DocumentFile>,
}

/// Hand an upload for `document` to the ingest pipeline
pub(crate) async fn accept_upload(
    state: &AppState,
    document: &Document,
    upload: Upload,
) -> Result<UploadAccepted> {
    let filename = upload.filename.clone();
    let comment = upload.comment.clone();
    let size = upload.content.len() as u64;

    let (status, file) = match state.ingest.submit(document.id, upload).await? {
        Submission::Completed(file) => (UploadStatus::Completed, Some(file)),
        Submission::Queued => (UploadStatus::Queued, None),
    };
    info!(document_id = %document.id, filename = %filename, size, ?status, "upload accepted");

    Ok(UploadAccepted {
        document_id: document.id,
        filename,
        comment,
        size,
        status,
        file,
    })
}

/// `GET /documents/{id}/files/`
///
/// Answers 404 only when the document is missing. Without
/// `document_file_view` the list is simply empty.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(document_id): Path<DocumentId>,
    Query(pagination): Query<PaginationQueryParams>,
) -> Result<Json<Page<DocumentFile>>> {
    let document = existing_document(&state, document_id, false)?;
    let visible = state.acl.has_access(
        &user,
        Permission::DocumentFileView,
        document.object_ref(),
        &document.acl_parents(),
    );
    let files = if visible {
        state.catalog.files_of(document.id)
    } else {
        Vec::new()
    };

    Ok(Json(pagination.paginate(files, &state.config.api)?))
}

/// `POST /documents/{id}/files/`: the request body is the file content
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(document_id): Path<DocumentId>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadAccepted>)> {
    let document = document_for(
        &state,
        &user,
        document_id,
        Permission::DocumentFileNew,
        false,
        AccessMode::Forbid,
    )?;
    let filename = params
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| Error::validation("filename", "This field is required."))?;

    let upload = Upload {
        filename,
        comment: params.comment.unwrap_or_default(),
        content: body,
    };
    let accepted = accept_upload(&state, &document, upload).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// `GET /documents/{id}/files/{file_id}/`
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((document_id, file_id)): Path<(DocumentId, DocumentFileId)>,
) -> Result<Json<DocumentFile>> {
    let (_, file) = file_for(&state, &user, document_id, file_id, Permission::DocumentFileView)?;
    Ok(Json(file))
}

/// `DELETE /documents/{id}/files/{file_id}/`
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((document_id, file_id)): Path<(DocumentId, DocumentFileId)>,
) -> Result<StatusCode> {
    file_for(&state, &user, document_id, file_id, Permission::DocumentFileDelete)?;

    let file = state.catalog.delete_file(document_id, file_id)?;
    state.discard_blob(&file.storage_key);
    Metrics::global().api.files_deleted.inc();
    info!(
        document_id = %document_id,
        file_id = %file_id,
        user = %user.username,
        "document file deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /documents/{id}/files/{file_id}/download/`
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((document_id, file_id)): Path<(DocumentId, DocumentFileId)>,
    Query(params): Query<DownloadParams>,
) -> Result<Response> {
    let (document, file) =
        file_for(&state, &user, document_id, file_id, Permission::DocumentFileDownload)?;

    let content = state.files.get(&file.storage_key)?;
    if checksum(&content) != file.checksum {
        return Err(StorageError::Corruption(file.storage_key).into());
    }
    let filename = file.rendered_filename(&document.label, params.preserve_extension);
    let mimetype = file
        .mimetype
        .parse::<mime::Mime>()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);
    let content_type = HeaderValue::from_str(mimetype.as_ref())
        .map_err(|e| Error::internal(format!("invalid Content-Type: {}", e)))?;
    let disposition = HeaderValue::from_str(&content_disposition(&filename))
        .map_err(|e| Error::internal(format!("invalid Content-Disposition: {}", e)))?;

    Metrics::global().api.downloads.inc();
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(content),
    )
        .into_response())
}

/// `GET /documents/{id}/files/{file_id}/pages/`
pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((document_id, file_id)): Path<(DocumentId, DocumentFileId)>,
    Query(pagination): Query<PaginationQueryParams>,
) -> Result<Json<Page<DocumentFilePage>>> {
    let (_, file) = file_for(&state, &user, document_id, file_id, Permission::DocumentFileView)?;
    let pages = state.catalog.pages_of(file.id);
    Ok(Json(pagination.paginate(pages, &state.config.api)?))
}

/// `GET /documents/{id}/files/{file_id}/pages/{page_id}/`
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((document_id, file_id, page_id)): Path<(DocumentId, DocumentFileId, DocumentFilePageId)>,
) -> Result<Json<DocumentFilePage>> {
    let (_, file) = file_for(&state, &user, document_id, file_id, Permission::DocumentFileView)?;
    let page = state
        .catalog
        .page(file.id, page_id)
        .ok_or_else(|| Error::not_found(format!("page {}", page_id)))?;
    Ok(Json(page))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if filename.is_ascii() && fallback == filename {
        return format!("attachment; filename=\"{}\"", fallback);
    }

    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
