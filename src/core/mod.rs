//! Core system types and foundations
//!
//! Identifiers, the document model, error handling, configuration and the
//! shared application state.

pub mod app_state;
pub mod config;
pub mod documents;
pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use app_state::AppState;
pub use config::Config;
pub use error::{Error, Result};
pub use types::{DocumentFileId, DocumentFilePageId, DocumentId, DocumentTypeId, UserId};
