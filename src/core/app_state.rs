//! Application State Management
//!
//! The central AppState holds every service a request handler needs. It is
//! built once at startup and shared behind an `Arc`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::ingest::{IngestQueue, Ingestor};
use crate::security::{AccessControlList, ObjectRef, Permission, User, UserRegistry};
use crate::storage::{create_file_storage, Catalog, Removal, SharedFileStorage};

/// Central application state holding all services and components
pub struct AppState {
    /// Application configuration
    pub config: Config,

    /// Entity store
    pub catalog: Arc<Catalog>,

    /// Blob storage for file content
    pub files: SharedFileStorage,

    /// Registered users and their tokens
    pub users: UserRegistry,

    /// Global and object grants
    pub acl: AccessControlList,

    /// Upload pipeline
    pub ingest: IngestQueue,

    /// Process start, reported by the health endpoint
    pub started_at: Instant,
}

impl AppState {
    /// Build every service from configuration
    ///
    /// Must run inside a Tokio runtime when uploads are processed in the
    /// background, since the ingest worker is spawned here.
    pub fn new(config: Config) -> Result<Self> {
        let files = create_file_storage(&config.storage)?;
        Self::with_file_storage(config, files)
    }

    /// Build every service around an already opened blob storage
    pub fn with_file_storage(config: Config, files: SharedFileStorage) -> Result<Self> {
        crate::system::metrics::init_registry();

        let catalog = Arc::new(Catalog::new());
        let ingestor = Arc::new(Ingestor::new(catalog.clone(), files.clone()));
        let ingest = IngestQueue::start(ingestor, &config.ingest);

        let state = Self {
            config,
            catalog,
            files,
            users: UserRegistry::new(),
            acl: AccessControlList::new(),
            ingest,
            started_at: Instant::now(),
        };
        state.register_configured_users()?;

        info!(
            storage = state.files.name(),
            users = state.users.len(),
            eager_ingest = state.ingest.is_eager(),
            "application state ready"
        );
        Ok(state)
    }

    fn register_configured_users(&self) -> Result<()> {
        for entry in &self.config.security.users {
            let user = self
                .users
                .create_user(&entry.username, entry.token.clone(), entry.superuser)?;
            for name in &entry.permissions {
                let permission = Permission::from_str(name)?;
                self.acl.grant_permission(user.id, permission);
            }
        }
        Ok(())
    }

    /// Register a user with global grants
    pub fn create_user(
        &self,
        username: &str,
        token: Option<String>,
        is_superuser: bool,
        permissions: &[Permission],
    ) -> Result<User> {
        let user = self.users.create_user(username, token, is_superuser)?;
        for permission in permissions {
            self.acl.grant_permission(user.id, *permission);
        }
        Ok(user)
    }

    /// Release the blobs and grants of removed entities
    pub fn discard(&self, removal: &Removal) {
        for key in &removal.storage_keys {
            self.discard_blob(key);
        }
        for document_id in &removal.documents {
            self.acl.forget(ObjectRef::Document(*document_id));
        }
    }

    /// Delete a blob, logging instead of failing
    ///
    /// The catalog entry is already gone, so a leftover blob is only wasted
    /// space.
    pub fn discard_blob(&self, key: &str) {
        if let Err(e) = self.files.delete(key) {
            warn!(key, error = %e, "failed to delete blob");
        }
    }
}
