//! Blob storage for uploaded file content

use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result, StorageError};

/// Storage backend for file content, addressed by opaque keys
pub trait FileStorage: Send + Sync {
    /// Store `data` under `key`, replacing any previous content
    fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Read the content stored under `key`
    fn get(&self, key: &str) -> Result<Bytes>;

    /// Remove the content stored under `key`; missing keys are ignored
    fn delete(&self, key: &str) -> Result<()>;

    /// Whether content is stored under `key`
    fn exists(&self, key: &str) -> bool;

    /// Backend name for logs and the info endpoint
    fn name(&self) -> &'static str;
}

/// Blobs kept in process memory
#[derive(Debug, Default)]
pub struct MemoryFileStorage {
    blobs: DashMap<String, Bytes>,
}

impl MemoryFileStorage {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no blob is stored
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl FileStorage for MemoryFileStorage {
    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.blobs.insert(key.to_string(), data);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        self.blobs
            .get(key)
            .map(|b| b.value().clone())
            .ok_or_else(|| StorageError::BlobNotFound(key.to_string()).into())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Blobs written as individual files below a root directory
#[derive(Debug)]
pub struct DiskFileStorage {
    root: PathBuf,
}

impl DiskFileStorage {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> std::result::Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        tracing::info!(root = %root.display(), "opened disk file storage");
        Ok(Self { root })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::invalid_input(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.root.join(key))
    }
}

impl FileStorage for DiskFileStorage {
    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.path_for(key)?;
        let partial = path.with_extension("partial");
        std::fs::write(&partial, &data).map_err(StorageError::DiskIo)?;
        std::fs::rename(&partial, &path).map_err(StorageError::DiskIo)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::BlobNotFound(key.to_string()).into())
            }
            Err(e) => Err(StorageError::DiskIo(e).into()),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DiskIo(e).into()),
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn FileStorage) {
        assert!(!storage.exists("abc"));
        assert!(matches!(
            storage.get("abc"),
            Err(Error::Storage(StorageError::BlobNotFound(_)))
        ));

        storage.put("abc", Bytes::from_static(b"hello")).unwrap();
        assert!(storage.exists("abc"));
        assert_eq!(storage.get("abc").unwrap(), Bytes::from_static(b"hello"));

        storage.put("abc", Bytes::from_static(b"replaced")).unwrap();
        assert_eq!(storage.get("abc").unwrap(), Bytes::from_static(b"replaced"));

        storage.delete("abc").unwrap();
        storage.delete("abc").unwrap();
        assert!(!storage.exists("abc"));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryFileStorage::new();
        exercise(&storage);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_disk_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskFileStorage::open(dir.path().join("blobs")).unwrap();
        exercise(&storage);
    }

    #[test]
    fn test_disk_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskFileStorage::open(dir.path()).unwrap();
        assert!(storage.put("../escape", Bytes::from_static(b"x")).is_err());
        assert!(storage.put("a/b", Bytes::from_static(b"x")).is_err());
        assert!(!storage.exists(""));
    }
}
