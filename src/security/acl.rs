//! Access control lists
//!
//! Grants come in two scopes. A global grant gives a user a permission on
//! every object. An object grant gives it on one object and on everything
//! that inherits from it (a document inherits from its document type).

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::core::error::{Error, Result};
use crate::core::types::{DocumentId, DocumentTypeId, UserId};
use crate::security::{Permission, User};

/// An object permissions can be granted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ObjectRef {
    /// A document type
    DocumentType(DocumentTypeId),
    /// A document
    Document(DocumentId),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::DocumentType(id) => write!(f, "document type {}", id),
            ObjectRef::Document(id) => write!(f, "document {}", id),
        }
    }
}

/// How a failed object check is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Report the object as missing (404)
    Hide,
    /// Report the action as forbidden (403)
    Forbid,
}

/// A single object grant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AccessEntry {
    /// Grantee
    pub user_id: UserId,
    /// Object the grant applies to
    pub object: ObjectRef,
    /// Granted permission
    pub permission: Permission,
}

#[derive(Debug, Default)]
struct Grants {
    global: HashSet<(UserId, Permission)>,
    objects: BTreeSet<AccessEntry>,
}

/// Thread-safe store of global and object grants
#[derive(Debug, Default)]
pub struct AccessControlList {
    grants: RwLock<Grants>,
}

impl AccessControlList {
    /// Create an empty ACL
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a permission on every object
    pub fn grant_permission(&self, user: UserId, permission: Permission) {
        tracing::debug!(%user, %permission, "global grant");
        self.grants.write().global.insert((user, permission));
    }

    /// Remove a global grant
    pub fn revoke_permission(&self, user: UserId, permission: Permission) {
        self.grants.write().global.remove(&(user, permission));
    }

    /// Grant a permission on one object
    pub fn grant_access(&self, user: UserId, object: ObjectRef, permission: Permission) {
        tracing::debug!(%user, %object, %permission, "object grant");
        self.grants.write().objects.insert(AccessEntry {
            user_id: user,
            object,
            permission,
        });
    }

    /// Remove an object grant
    pub fn revoke_access(&self, user: UserId, object: ObjectRef, permission: Permission) {
        self.grants.write().objects.remove(&AccessEntry {
            user_id: user,
            object,
            permission,
        });
    }

    /// Whether the user holds the permission globally
    pub fn has_permission(&self, user: &User, permission: Permission) -> bool {
        user.is_superuser || self.grants.read().global.contains(&(user.id, permission))
    }

    /// Whether the user holds the permission on `object` or on any of `parents`
    pub fn has_access(
        &self,
        user: &User,
        permission: Permission,
        object: ObjectRef,
        parents: &[ObjectRef],
    ) -> bool {
        if user.is_superuser {
            return true;
        }

        let grants = self.grants.read();
        if grants.global.contains(&(user.id, permission)) {
            return true;
        }

        std::iter::once(&object).chain(parents).any(|target| {
            grants.objects.contains(&AccessEntry {
                user_id: user.id,
                object: *target,
                permission,
            })
        })
    }

    /// Require a global permission
    pub fn check_permission(&self, user: &User, permission: Permission) -> Result<()> {
        if self.has_permission(user, permission) {
            Ok(())
        } else {
            tracing::info!(user = %user.username, %permission, "permission denied");
            Err(Error::forbidden(format!("missing {}", permission)))
        }
    }

    /// Require a permission on an object, failing according to `mode`
    pub fn check_access(
        &self,
        user: &User,
        permission: Permission,
        object: ObjectRef,
        parents: &[ObjectRef],
        mode: AccessMode,
    ) -> Result<()> {
        if self.has_access(user, permission, object, parents) {
            return Ok(());
        }

        tracing::info!(user = %user.username, %permission, %object, "access denied");
        match mode {
            AccessMode::Hide => Err(Error::not_found(object.to_string())),
            AccessMode::Forbid => Err(Error::forbidden(format!(
                "missing {} on {}",
                permission, object
            ))),
        }
    }

    /// Object grants recorded directly on `object`
    pub fn grants_for(&self, object: ObjectRef) -> Vec<AccessEntry> {
        self.grants
            .read()
            .objects
            .iter()
            .filter(|entry| entry.object == object)
            .cloned()
            .collect()
    }

    /// Drop every grant on a deleted object
    pub fn forget(&self, object: ObjectRef) {
        self.grants.write().objects.retain(|entry| entry.object != object);
    }
}
