//! Storage and persistence layer
//!
//! The catalog holds entity records; blob storage holds file content.

pub mod catalog;
pub mod factory;
pub mod files;

// Re-export main storage types
pub use catalog::{Catalog, CatalogStats, DocumentChanges, NewDocument, NewDocumentFile, Removal};
pub use factory::{create_file_storage, SharedFileStorage, StorageFactoryError};
pub use files::{DiskFileStorage, FileStorage, MemoryFileStorage};
