//! Uploaded document files and their pages.
//!
//! A [`DocumentFile`] is immutable once recorded: the bytes live in blob
//! storage under `storage_key` and the metadata (checksum, MIME type,
//! encoding, size) is computed once at ingest time. The only mutation a
//! file supports is deletion.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::types::{DocumentFileId, DocumentFilePageId, DocumentId};
use crate::core::utils::split_extension;

/// Format of timestamps rendered into download filenames
const RENDERED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One uploaded binary version of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFile {
    /// File identifier
    pub id: DocumentFileId,
    /// Owning document
    pub document_id: DocumentId,
    /// Upload time
    pub timestamp: DateTime<Utc>,
    /// Name supplied by the uploader
    pub filename: String,
    /// Uploader comment
    pub comment: String,
    /// Lowercase hex SHA-256 of the content
    pub checksum: String,
    /// Detected MIME type
    pub mimetype: String,
    /// Detected encoding
    pub encoding: String,
    /// Content length in bytes
    pub size: u64,
    /// Number of pages detected in the content
    pub page_count: u32,
    /// Blob storage key
    #[serde(skip_serializing)]
    pub storage_key: String,
}

impl DocumentFile {
    /// Timestamp as shown to users
    pub fn rendered_timestamp(&self) -> String {
        self.timestamp.format(RENDERED_TIMESTAMP_FORMAT).to_string()
    }

    /// Name used for downloads
    ///
    /// `"{label} - {timestamp}"`, or with `preserve_extension`
    /// `"{stem} ({timestamp}){extension}"` so the document label's extension
    /// survives at the end of the name.
    pub fn rendered_filename(&self, document_label: &str, preserve_extension: bool) -> String {
        if preserve_extension {
            let (stem, extension) = split_extension(document_label);
            format!("{} ({}){}", stem, self.rendered_timestamp(), extension)
        } else {
            format!("{} - {}", document_label, self.rendered_timestamp())
        }
    }
}

/// A page of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFilePage {
    /// Page identifier
    pub id: DocumentFilePageId,
    /// Owning file
    pub document_file_id: DocumentFileId,
    /// 1-based position within the file
    pub page_number: u32,
}
