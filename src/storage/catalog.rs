//! In-memory catalog of document types, documents, files and pages
//!
//! All entity tables sit behind one `RwLock` so multi-table operations
//! (cascading deletes, file + page inserts) are atomic with respect to
//! readers. Blob bytes are not kept here; the catalog only records the
//! storage key of each file and hands keys back when files go away.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::core::documents::document::{clean_language, DEFAULT_LANGUAGE};
use crate::core::documents::document_type::clean_label;
use crate::core::documents::{Document, DocumentFile, DocumentFilePage, DocumentType};
use crate::core::error::{Error, Result};
use crate::core::types::{
    DocumentFileId, DocumentFilePageId, DocumentId, DocumentTypeId, IdSequence,
};
use crate::core::utils;

/// Fields of a document to create
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Owning document type
    pub document_type_id: DocumentTypeId,
    /// Display label
    pub label: String,
    /// Description, empty when absent
    pub description: Option<String>,
    /// Language code, defaults to [`DEFAULT_LANGUAGE`]
    pub language: Option<String>,
}

/// Partial update of a document's properties
#[derive(Debug, Clone, Default)]
pub struct DocumentChanges {
    /// New label
    pub label: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New language code
    pub language: Option<String>,
}

/// Metadata of a file about to be recorded
#[derive(Debug, Clone)]
pub struct NewDocumentFile {
    /// Owning document
    pub document_id: DocumentId,
    /// Name supplied by the uploader
    pub filename: String,
    /// Uploader comment
    pub comment: String,
    /// Lowercase hex SHA-256
    pub checksum: String,
    /// Detected MIME type
    pub mimetype: String,
    /// Detected encoding
    pub encoding: String,
    /// Content length
    pub size: u64,
    /// Detected page count
    pub page_count: u32,
    /// Blob storage key
    pub storage_key: String,
}

/// What a delete removed, so callers can clean up blobs and grants
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Documents removed
    pub documents: Vec<DocumentId>,
    /// Storage keys of removed files
    pub storage_keys: Vec<String>,
}

/// Entity counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CatalogStats {
    /// Number of document types
    pub document_types: usize,
    /// Number of documents, trashed included
    pub documents: usize,
    /// Number of document files
    pub files: usize,
}

#[derive(Debug, Default)]
struct Tables {
    document_types: BTreeMap<DocumentTypeId, DocumentType>,
    documents: BTreeMap<DocumentId, Document>,
    files: BTreeMap<DocumentFileId, DocumentFile>,
    pages: BTreeMap<DocumentFilePageId, DocumentFilePage>,
}

impl Tables {
    fn label_taken(&self, label: &str, except: Option<DocumentTypeId>) -> bool {
        self.document_types
            .values()
            .any(|t| t.label == label && Some(t.id) != except)
    }

    fn files_of(&self, document_id: DocumentId) -> Vec<DocumentFile> {
        let mut files: Vec<DocumentFile> = self
            .files
            .values()
            .filter(|f| f.document_id == document_id)
            .cloned()
            .collect();
        files.sort_by_key(|f| (f.timestamp, f.id));
        files
    }

    fn remove_file(&mut self, file_id: DocumentFileId) -> Option<DocumentFile> {
        let file = self.files.remove(&file_id)?;
        self.pages.retain(|_, page| page.document_file_id != file_id);
        Some(file)
    }

    fn remove_document(&mut self, document_id: DocumentId, removal: &mut Removal) {
        if self.documents.remove(&document_id).is_none() {
            return;
        }
        let file_ids: Vec<DocumentFileId> = self
            .files
            .values()
            .filter(|f| f.document_id == document_id)
            .map(|f| f.id)
            .collect();
        for file_id in file_ids {
            if let Some(file) = self.remove_file(file_id) {
                removal.storage_keys.push(file.storage_key);
            }
        }
        removal.documents.push(document_id);
    }
}

/// Thread-safe entity store
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<Tables>,
    document_type_ids: IdSequence,
    document_ids: IdSequence,
    file_ids: IdSequence,
    page_ids: IdSequence,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Entity counts
    pub fn stats(&self) -> CatalogStats {
        let tables = self.tables.read();
        CatalogStats {
            document_types: tables.document_types.len(),
            documents: tables.documents.len(),
            files: tables.files.len(),
        }
    }

    // Document types

    /// Create a document type with a unique label
    pub fn create_document_type(&self, label: &str) -> Result<DocumentType> {
        let label = clean_label(label)?;
        let mut tables = self.tables.write();
        if tables.label_taken(&label, None) {
            return Err(Error::validation(
                "label",
                "document type with this label already exists.",
            ));
        }

        let document_type = DocumentType {
            id: self.document_type_ids.next(),
            label,
        };
        tables
            .document_types
            .insert(document_type.id, document_type.clone());
        Ok(document_type)
    }

    /// Look up a document type
    pub fn document_type(&self, id: DocumentTypeId) -> Option<DocumentType> {
        self.tables.read().document_types.get(&id).cloned()
    }

    /// All document types ordered by id
    pub fn document_types(&self) -> Vec<DocumentType> {
        self.tables.read().document_types.values().cloned().collect()
    }

    /// Relabel a document type
    pub fn update_document_type(&self, id: DocumentTypeId, label: &str) -> Result<DocumentType> {
        let label = clean_label(label)?;
        let mut tables = self.tables.write();
        if tables.label_taken(&label, Some(id)) {
            return Err(Error::validation(
                "label",
                "document type with this label already exists.",
            ));
        }
        let document_type = tables
            .document_types
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("document type {}", id)))?;
        document_type.label = label;
        Ok(document_type.clone())
    }

    /// Delete a document type together with its documents and their files
    pub fn delete_document_type(&self, id: DocumentTypeId) -> Result<Removal> {
        let mut tables = self.tables.write();
        tables
            .document_types
            .remove(&id)
            .ok_or_else(|| Error::not_found(format!("document type {}", id)))?;

        let document_ids: Vec<DocumentId> = tables
            .documents
            .values()
            .filter(|d| d.document_type_id == id)
            .map(|d| d.id)
            .collect();

        let mut removal = Removal::default();
        for document_id in document_ids {
            tables.remove_document(document_id, &mut removal);
        }
        Ok(removal)
    }

    // Documents

    /// Create a document of an existing type
    pub fn create_document(&self, new: NewDocument) -> Result<Document> {
        let label = new.label.trim().to_string();
        if label.is_empty() {
            return Err(Error::validation("label", "This field may not be blank."));
        }
        let language = match new.language {
            Some(language) => clean_language(&language)?,
            None => DEFAULT_LANGUAGE.to_string(),
        };

        let mut tables = self.tables.write();
        if !tables.document_types.contains_key(&new.document_type_id) {
            return Err(Error::validation(
                "document_type_id",
                format!("Invalid pk \"{}\" - object does not exist.", new.document_type_id),
            ));
        }

        let document = Document {
            id: self.document_ids.next(),
            uuid: Uuid::new_v4(),
            document_type_id: new.document_type_id,
            label,
            description: new.description.unwrap_or_default(),
            language,
            datetime_created: utils::now(),
            in_trash: false,
            trashed_date_time: None,
        };
        tables.documents.insert(document.id, document.clone());
        Ok(document)
    }

    /// Look up a document, trashed or not
    pub fn document(&self, id: DocumentId) -> Option<Document> {
        self.tables.read().documents.get(&id).cloned()
    }

    /// All documents ordered by id, trashed included
    pub fn documents(&self) -> Vec<Document> {
        self.tables.read().documents.values().cloned().collect()
    }

    /// Number of documents of a type
    pub fn document_count_of_type(&self, id: DocumentTypeId) -> usize {
        self.tables
            .read()
            .documents
            .values()
            .filter(|d| d.document_type_id == id)
            .count()
    }

    /// Apply property changes to a document
    pub fn update_document(&self, id: DocumentId, changes: DocumentChanges) -> Result<Document> {
        let label = match changes.label {
            Some(label) if label.trim().is_empty() => {
                return Err(Error::validation("label", "This field may not be blank."))
            }
            Some(label) => Some(label.trim().to_string()),
            None => None,
        };
        let language = changes.language.as_deref().map(clean_language).transpose()?;

        let mut tables = self.tables.write();
        let document = tables
            .documents
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("document {}", id)))?;

        if let Some(label) = label {
            document.label = label;
        }
        if let Some(description) = changes.description {
            document.description = description;
        }
        if let Some(language) = language {
            document.language = language;
        }
        Ok(document.clone())
    }

    /// Move a document into or out of the trash
    pub fn set_trashed(&self, id: DocumentId, trashed: bool) -> Result<Document> {
        let mut tables = self.tables.write();
        let document = tables
            .documents
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("document {}", id)))?;
        document.in_trash = trashed;
        document.trashed_date_time = trashed.then(utils::now);
        Ok(document.clone())
    }

    /// Delete a document and its files
    pub fn delete_document(&self, id: DocumentId) -> Result<Removal> {
        let mut tables = self.tables.write();
        if !tables.documents.contains_key(&id) {
            return Err(Error::not_found(format!("document {}", id)));
        }
        let mut removal = Removal::default();
        tables.remove_document(id, &mut removal);
        Ok(removal)
    }

    // Files

    /// Record a new file and its pages; it becomes the document's latest file
    pub fn add_file(&self, new: NewDocumentFile) -> Result<DocumentFile> {
        let mut tables = self.tables.write();
        if !tables.documents.contains_key(&new.document_id) {
            return Err(Error::not_found(format!("document {}", new.document_id)));
        }

        // Keep upload order strict even when the clock does not advance
        let mut timestamp: DateTime<Utc> = utils::now();
        if let Some(latest) = tables.files_of(new.document_id).last() {
            if timestamp <= latest.timestamp {
                timestamp = latest.timestamp + chrono::Duration::microseconds(1);
            }
        }

        let file = DocumentFile {
            id: self.file_ids.next(),
            document_id: new.document_id,
            timestamp,
            filename: new.filename,
            comment: new.comment,
            checksum: new.checksum,
            mimetype: new.mimetype,
            encoding: new.encoding,
            size: new.size,
            page_count: new.page_count,
            storage_key: new.storage_key,
        };

        for page_number in 1..=file.page_count {
            let page = DocumentFilePage {
                id: self.page_ids.next(),
                document_file_id: file.id,
                page_number,
            };
            tables.pages.insert(page.id, page);
        }
        tables.files.insert(file.id, file.clone());
        Ok(file)
    }

    /// Files of a document in upload order
    pub fn files_of(&self, document_id: DocumentId) -> Vec<DocumentFile> {
        self.tables.read().files_of(document_id)
    }

    /// A file, provided it belongs to `document_id`
    pub fn file(&self, document_id: DocumentId, file_id: DocumentFileId) -> Option<DocumentFile> {
        self.tables
            .read()
            .files
            .get(&file_id)
            .filter(|f| f.document_id == document_id)
            .cloned()
    }

    /// The most recently uploaded file of a document
    pub fn latest_file(&self, document_id: DocumentId) -> Option<DocumentFile> {
        self.tables.read().files_of(document_id).pop()
    }

    /// Page count of the document's latest file, 0 without files
    pub fn page_count(&self, document_id: DocumentId) -> u32 {
        self.latest_file(document_id)
            .map(|f| f.page_count)
            .unwrap_or(0)
    }

    /// Remove a file and its pages
    pub fn delete_file(
        &self,
        document_id: DocumentId,
        file_id: DocumentFileId,
    ) -> Result<DocumentFile> {
        let mut tables = self.tables.write();
        match tables.files.get(&file_id) {
            Some(file) if file.document_id == document_id => {}
            _ => return Err(Error::not_found(format!("document file {}", file_id))),
        }
        tables
            .remove_file(file_id)
            .ok_or_else(|| Error::not_found(format!("document file {}", file_id)))
    }

    // Pages

    /// Pages of a file ordered by page number
    pub fn pages_of(&self, file_id: DocumentFileId) -> Vec<DocumentFilePage> {
        let mut pages: Vec<DocumentFilePage> = self
            .tables
            .read()
            .pages
            .values()
            .filter(|p| p.document_file_id == file_id)
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.page_number);
        pages
    }

    /// A page, provided it belongs to `file_id`
    pub fn page(
        &self,
        file_id: DocumentFileId,
        page_id: DocumentFilePageId,
    ) -> Option<DocumentFilePage> {
        self.tables
            .read()
            .pages
            .get(&page_id)
            .filter(|p| p.document_file_id == file_id)
            .cloned()
    }
}
