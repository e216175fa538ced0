//! Document domain entities
//!
//! - [`DocumentType`]: classification owning documents
//! - [`Document`]: a logical record holding a history of files
//! - [`DocumentFile`]: one uploaded binary version of a document
//! - [`DocumentFilePage`]: a page of an uploaded file

pub mod document;
pub mod document_type;
pub mod file;

pub use document::Document;
pub use document_type::DocumentType;
pub use file::{DocumentFile, DocumentFilePage};
