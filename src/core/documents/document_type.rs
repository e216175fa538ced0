//! Document types

use serde::Serialize;

use crate::core::error::{Error, Result};
use crate::core::types::DocumentTypeId;

/// Longest accepted label
pub const LABEL_MAX_LENGTH: usize = 196;

/// A category assigned to documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentType {
    /// Document type identifier
    pub id: DocumentTypeId,
    /// Unique display label
    pub label: String,
}

/// Trim and check a document type label
pub fn clean_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(Error::validation("label", "This field may not be blank."));
    }
    if label.chars().count() > LABEL_MAX_LENGTH {
        return Err(Error::validation(
            "label",
            format!("Ensure this field has no more than {} characters.", LABEL_MAX_LENGTH),
        ));
    }
    Ok(label.to_string())
}
