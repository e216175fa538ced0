//! Content inspection for uploaded files
//!
//! Detects checksum, MIME type, encoding and page count from the raw bytes.
//! Nothing here trusts the uploader's filename.

use sha2::{Digest, Sha256};
use tracing::debug;

/// MIME type reported for zero-length uploads
pub const EMPTY_MIMETYPE: &str = "application/x-empty";

const PDF_MIMETYPE: &str = "application/pdf";
const TEXT_MIMETYPE: &str = "text/plain";
const BINARY_MIMETYPE: &str = "application/octet-stream";

/// Facts derived from a file's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Lowercase hex SHA-256 of the content
    pub checksum: String,
    /// Detected MIME type
    pub mimetype: String,
    /// `binary`, `us-ascii` or `utf-8`
    pub encoding: String,
    /// Content length in bytes
    pub size: u64,
    /// Number of pages, at least 1
    pub page_count: u32,
}

/// Inspect uploaded content
pub fn inspect(data: &[u8]) -> FileInfo {
    let (mimetype, encoding) = detect(data);
    let page_count = if mimetype == PDF_MIMETYPE {
        pdf_page_count(data)
    } else {
        1
    };

    FileInfo {
        checksum: checksum(data),
        mimetype: mimetype.to_string(),
        encoding: encoding.to_string(),
        size: data.len() as u64,
        page_count,
    }
}

/// Lowercase hex SHA-256 of `data`
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", PDF_MIMETYPE),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"II*\x00", "image/tiff"),
    (b"MM\x00*", "image/tiff"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
];

fn detect(data: &[u8]) -> (&'static str, &'static str) {
    if data.is_empty() {
        return (EMPTY_MIMETYPE, "binary");
    }

    if let Some((_, mimetype)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return (*mimetype, "binary");
    }

    match text_encoding(data) {
        Some(encoding) => (TEXT_MIMETYPE, encoding),
        None => (BINARY_MIMETYPE, "binary"),
    }
}

fn text_encoding(data: &[u8]) -> Option<&'static str> {
    let text = std::str::from_utf8(data).ok()?;
    let printable = text
        .chars()
        .all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r' | '\x0c'));
    if !printable {
        return None;
    }
    Some(if text.is_ascii() { "us-ascii" } else { "utf-8" })
}

/// Number of pages of a PDF, at least 1
///
/// Walks the page tree so that pages stored in compressed object streams
/// are counted. Files the parser rejects fall back to a raw scan.
fn pdf_page_count(data: &[u8]) -> u32 {
    let parsed = match lopdf::Document::load_mem(data) {
        Ok(document) => u32::try_from(document.get_pages().len()).unwrap_or(u32::MAX),
        Err(e) => {
            debug!(error = %e, "unparseable PDF, scanning for page objects");
            0
        }
    };
    if parsed > 0 {
        parsed
    } else {
        scan_page_objects(data).max(1)
    }
}

/// Count `/Type /Page` objects, skipping the `/Type /Pages` tree nodes
fn scan_page_objects(data: &[u8]) -> u32 {
    const TYPE: &[u8] = b"/Type";
    const PAGE: &[u8] = b"/Page";

    let mut count = 0;
    let mut index = 0;
    while let Some(offset) = find(&data[index..], TYPE) {
        let mut cursor = index + offset + TYPE.len();
        while cursor < data.len() && data[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if data[cursor..].starts_with(PAGE) {
            let after = cursor + PAGE.len();
            if data.get(after).map_or(true, |b| !b.is_ascii_alphanumeric()) {
                count += 1;
            }
        }
        index = cursor;
    }
    count
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
