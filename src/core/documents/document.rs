//! Documents and their ACL relationships

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::error::{Error, Result};
use crate::core::types::{DocumentId, DocumentTypeId};
use crate::security::ObjectRef;

/// Language assigned when a document is created without one
pub const DEFAULT_LANGUAGE: &str = "eng";

/// A logical record that can hold multiple versioned files
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Document identifier
    pub id: DocumentId,
    /// Stable external identifier
    pub uuid: Uuid,
    /// Owning document type
    pub document_type_id: DocumentTypeId,
    /// Display label, usually the original filename
    pub label: String,
    /// Free text description
    pub description: String,
    /// ISO 639-3 language code
    pub language: String,
    /// Creation time
    pub datetime_created: DateTime<Utc>,
    /// Whether the document sits in the trash
    pub in_trash: bool,
    /// When the document was moved to the trash
    pub trashed_date_time: Option<DateTime<Utc>>,
}

impl Document {
    /// ACL handle of this document
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::Document(self.id)
    }

    /// Objects this document inherits grants from
    pub fn acl_parents(&self) -> [ObjectRef; 1] {
        [ObjectRef::DocumentType(self.document_type_id)]
    }
}

/// Check a document language code (three lowercase ASCII letters)
pub fn clean_language(language: &str) -> Result<String> {
    let language = language.trim();
    if language.len() == 3 && language.bytes().all(|b| b.is_ascii_lowercase()) {
        Ok(language.to_string())
    } else {
        Err(Error::validation(
            "language",
            format!("\"{}\" is not a valid choice.", language),
        ))
    }
}
