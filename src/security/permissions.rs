//! Named permissions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::Error;

/// Individual permission that can be granted to users
///
/// Rendered as `namespace.name`, e.g. `documents.document_file_download`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// Create documents of a document type
    DocumentCreate,
    /// Edit documents
    DocumentEdit,
    /// Edit document properties (label, description, language)
    DocumentPropertiesEdit,
    /// View documents
    DocumentView,
    /// Move documents to the trash
    DocumentTrash,
    /// Permanently delete trashed documents
    TrashedDocumentDelete,
    /// Restore trashed documents
    TrashedDocumentRestore,
    /// View trashed documents
    TrashedDocumentView,
    /// Upload new files for a document
    DocumentFileNew,
    /// Delete document files
    DocumentFileDelete,
    /// Download document files
    DocumentFileDownload,
    /// View document files and their pages
    DocumentFileView,
    /// Create document types
    DocumentTypeCreate,
    /// Delete document types
    DocumentTypeDelete,
    /// Edit document types
    DocumentTypeEdit,
    /// View document types
    DocumentTypeView,
    /// Grant access on an object
    AclEdit,
    /// List the grants of an object
    AclView,
}

impl Permission {
    /// Every known permission, in display order
    pub const ALL: [Permission; 18] = [
        Permission::DocumentCreate,
        Permission::DocumentEdit,
        Permission::DocumentPropertiesEdit,
        Permission::DocumentView,
        Permission::DocumentTrash,
        Permission::TrashedDocumentDelete,
        Permission::TrashedDocumentRestore,
        Permission::TrashedDocumentView,
        Permission::DocumentFileNew,
        Permission::DocumentFileDelete,
        Permission::DocumentFileDownload,
        Permission::DocumentFileView,
        Permission::DocumentTypeCreate,
        Permission::DocumentTypeDelete,
        Permission::DocumentTypeEdit,
        Permission::DocumentTypeView,
        Permission::AclEdit,
        Permission::AclView,
    ];

    /// Namespace the permission belongs to
    pub fn namespace(&self) -> &'static str {
        match self {
            Permission::AclEdit | Permission::AclView => "acls",
            _ => "documents",
        }
    }

    /// Short name within the namespace
    pub fn name(&self) -> &'static str {
        match self {
            Permission::DocumentCreate => "document_create",
            Permission::DocumentEdit => "document_edit",
            Permission::DocumentPropertiesEdit => "document_properties_edit",
            Permission::DocumentView => "document_view",
            Permission::DocumentTrash => "document_trash",
            Permission::TrashedDocumentDelete => "trashed_document_delete",
            Permission::TrashedDocumentRestore => "trashed_document_restore",
            Permission::TrashedDocumentView => "trashed_document_view",
            Permission::DocumentFileNew => "document_file_new",
            Permission::DocumentFileDelete => "document_file_delete",
            Permission::DocumentFileDownload => "document_file_download",
            Permission::DocumentFileView => "document_file_view",
            Permission::DocumentTypeCreate => "document_type_create",
            Permission::DocumentTypeDelete => "document_type_delete",
            Permission::DocumentTypeEdit => "document_type_edit",
            Permission::DocumentTypeView => "document_type_view",
            Permission::AclEdit => "acl_edit",
            Permission::AclView => "acl_view",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Permission::DocumentCreate => "Create documents",
            Permission::DocumentEdit => "Edit documents",
            Permission::DocumentPropertiesEdit => "Edit document properties",
            Permission::DocumentView => "View documents",
            Permission::DocumentTrash => "Move documents to trash",
            Permission::TrashedDocumentDelete => "Delete trashed documents",
            Permission::TrashedDocumentRestore => "Restore trashed documents",
            Permission::TrashedDocumentView => "View trashed documents",
            Permission::DocumentFileNew => "Create new document files",
            Permission::DocumentFileDelete => "Delete document files",
            Permission::DocumentFileDownload => "Download document files",
            Permission::DocumentFileView => "View document files",
            Permission::DocumentTypeCreate => "Create document types",
            Permission::DocumentTypeDelete => "Delete document types",
            Permission::DocumentTypeEdit => "Edit document types",
            Permission::DocumentTypeView => "View document types",
            Permission::AclEdit => "Edit ACLs",
            Permission::AclView => "View ACLs",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace(), self.name())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = s
            .split_once('.')
            .ok_or_else(|| Error::invalid_input(format!("Malformed permission: {}", s)))?;

        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.namespace() == namespace && p.name() == name)
            .ok_or_else(|| Error::invalid_input(format!("Unknown permission: {}", s)))
    }
}

impl Serialize for Permission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all() {
        for permission in Permission::ALL {
            let parsed: Permission = permission.to_string().parse().unwrap();
            assert_eq!(parsed, permission);
        }
    }

    #[test]
    fn test_rendering() {
        assert_eq!(
            Permission::DocumentFileDownload.to_string(),
            "documents.document_file_download"
        );
        assert_eq!(Permission::AclView.to_string(), "acls.acl_view");
    }

    #[test]
    fn test_reject_wrong_namespace() {
        assert!("acls.document_view".parse::<Permission>().is_err());
        assert!("document_view".parse::<Permission>().is_err());
    }
}
