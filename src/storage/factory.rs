//! Storage factory for creating blob storage implementations based on configuration

use crate::core::config::{StorageConfig, StorageType};
use crate::core::error::StorageError;
use crate::storage::{DiskFileStorage, FileStorage, MemoryFileStorage};
use std::sync::Arc;
use thiserror::Error;

/// Storage factory error
#[derive(Error, Debug)]
pub enum StorageFactoryError {
    /// Storage initialization failed
    #[error("Storage initialization failed: {0}")]
    InitializationFailed(#[from] StorageError),
}

/// Shared handle to the configured blob storage
pub type SharedFileStorage = Arc<dyn FileStorage>;

/// Create a blob storage implementation based on configuration
pub fn create_file_storage(
    config: &StorageConfig,
) -> Result<SharedFileStorage, StorageFactoryError> {
    match config.storage_type {
        StorageType::Memory => Ok(Arc::new(MemoryFileStorage::new())),
        StorageType::Disk => {
            let storage = DiskFileStorage::open(config.data_dir.join("files"))?;
            Ok(Arc::new(storage))
        }
    }
}
