mod common;

use axum::http::{Method, StatusCode};
use bytes::Bytes;
use common::{pdf, TestApp, ADMIN_TOKEN, USER_TOKEN};
use docvault::core::error::{Result, StorageError};
use docvault::security::{ObjectRef, Permission};
use docvault::storage::FileStorage;
use serde_json::json;
use std::sync::Arc;

const DOCUMENTS_URL: &str = "/api/v4/documents/";
const TRASH_URL: &str = "/api/v4/trashed_documents/";

#[tokio::test]
async fn test_create_without_permission() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");

    let response = app
        .json(
            Method::POST,
            DOCUMENTS_URL,
            USER_TOKEN,
            json!({ "document_type_id": document_type.id.0, "label": "invoice" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.state.catalog.documents().is_empty());
}

#[tokio::test]
async fn test_create_with_access_on_type() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");
    app.grant(
        ObjectRef::DocumentType(document_type.id),
        Permission::DocumentCreate,
    );

    let response = app
        .json(
            Method::POST,
            DOCUMENTS_URL,
            USER_TOKEN,
            json!({ "document_type_id": document_type.id.0, "label": "invoice" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["label"], "invoice");
    assert_eq!(body["language"], "eng");
    assert_eq!(body["files_count"], 0);
    assert_eq!(body["page_count"], 0);
    assert!(body["file_latest"].is_null());
}

#[tokio::test]
async fn test_create_with_unknown_type() {
    let app = TestApp::new();
    let response = app
        .json(
            Method::POST,
            DOCUMENTS_URL,
            ADMIN_TOKEN,
            json!({ "document_type_id": 42, "label": "invoice" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["document_type_id"].is_array());
}

#[tokio::test]
async fn test_view_and_list_follow_grants() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");
    let visible = app.document(&document_type, "visible");
    let hidden = app.document(&document_type, "hidden");
    app.grant(visible.object_ref(), Permission::DocumentView);

    let list = app.get(DOCUMENTS_URL, USER_TOKEN).await.json();
    assert_eq!(list["count"], 1);
    assert_eq!(list["results"][0]["label"], "visible");

    let response = app
        .get(&format!("{}{}/", DOCUMENTS_URL, hidden.id), USER_TOKEN)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_document_reports_latest_file() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    let files_url = format!("{}{}/files/?filename=a.pdf", DOCUMENTS_URL, document.id);
    app.post_bytes(&files_url, ADMIN_TOKEN, &pdf(2)).await;
    app.post_bytes(&files_url, ADMIN_TOKEN, &pdf(5)).await;

    let body = app
        .get(&format!("{}{}/", DOCUMENTS_URL, document.id), ADMIN_TOKEN)
        .await
        .json();
    assert_eq!(body["files_count"], 2);
    assert_eq!(body["page_count"], 5);
    assert_eq!(body["file_latest"]["page_count"], 5);
}

#[tokio::test]
async fn test_edit_properties() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice");
    let url = format!("{}{}/", DOCUMENTS_URL, document.id);

    let hidden = app
        .json(Method::PATCH, &url, USER_TOKEN, json!({ "description": "x" }))
        .await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    app.grant(document.object_ref(), Permission::DocumentPropertiesEdit);
    let response = app
        .json(
            Method::PATCH,
            &url,
            USER_TOKEN,
            json!({ "description": "March", "language": "deu" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let stored = app.state.catalog.document(document.id).unwrap();
    assert_eq!(stored.description, "March");
    assert_eq!(stored.language, "deu");
    assert_eq!(stored.label, "invoice");

    let invalid = app
        .json(Method::PATCH, &url, USER_TOKEN, json!({ "language": "German" }))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trash_restore_and_delete() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice");
    app.post_bytes(
        &format!("{}{}/files/?filename=a.txt", DOCUMENTS_URL, document.id),
        ADMIN_TOKEN,
        b"content",
    )
    .await;
    let storage_key = app.state.catalog.latest_file(document.id).unwrap().storage_key;
    let document_url = format!("{}{}/", DOCUMENTS_URL, document.id);

    let denied = app.delete(&document_url, USER_TOKEN).await;
    assert_eq!(denied.status, StatusCode::NOT_FOUND);

    app.grant(document.object_ref(), Permission::DocumentTrash);
    let trashed = app.delete(&document_url, USER_TOKEN).await;
    assert_eq!(trashed.status, StatusCode::ACCEPTED);
    assert!(app.state.catalog.document(document.id).unwrap().in_trash);

    // Trashed documents leave the live endpoints
    let live = app.get(&document_url, ADMIN_TOKEN).await;
    assert_eq!(live.status, StatusCode::NOT_FOUND);
    let trash = app.get(TRASH_URL, ADMIN_TOKEN).await.json();
    assert_eq!(trash["count"], 1);

    let restore_url = format!("{}{}/restore/", TRASH_URL, document.id);
    let restored = app.json(Method::POST, &restore_url, ADMIN_TOKEN, json!({})).await;
    assert_eq!(restored.status, StatusCode::OK);
    assert!(!app.state.catalog.document(document.id).unwrap().in_trash);

    app.delete(&document_url, ADMIN_TOKEN).await;
    let trashed_url = format!("{}{}/", TRASH_URL, document.id);
    let denied = app.delete(&trashed_url, USER_TOKEN).await;
    assert_eq!(denied.status, StatusCode::NOT_FOUND);

    let deleted = app.delete(&trashed_url, ADMIN_TOKEN).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(app.state.catalog.document(document.id).is_none());
    assert!(!app.state.files.exists(&storage_key));
}

#[tokio::test]
async fn test_upload_creates_document() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");
    let url = format!(
        "{}upload/?document_type_id={}&filename=scan.pdf",
        DOCUMENTS_URL, document_type.id
    );

    let denied = app.post_bytes(&url, USER_TOKEN, &pdf(1)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    app.grant(
        ObjectRef::DocumentType(document_type.id),
        Permission::DocumentCreate,
    );
    let response = app.post_bytes(&url, USER_TOKEN, &pdf(2)).await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let documents = app.state.catalog.documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].label, "scan.pdf");
    assert_eq!(app.state.catalog.page_count(documents[0].id), 2);
}

/// Blob storage whose writes always fail
struct ReadOnlyStorage;

impl FileStorage for ReadOnlyStorage {
    fn put(&self, _key: &str, _data: Bytes) -> Result<()> {
        let e = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        Err(StorageError::DiskIo(e).into())
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        Err(StorageError::BlobNotFound(key.to_string()).into())
    }

    fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn exists(&self, _key: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "read-only"
    }
}

#[tokio::test]
async fn test_failed_upload_leaves_no_document() {
    let app = TestApp::with_file_storage(Arc::new(ReadOnlyStorage));
    let document_type = app.document_type("Invoices");
    let url = format!(
        "{}upload/?document_type_id={}&filename=scan.pdf",
        DOCUMENTS_URL, document_type.id
    );

    let response = app.post_bytes(&url, ADMIN_TOKEN, &pdf(1)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.state.catalog.documents().is_empty());
    assert_eq!(app.state.catalog.document_count_of_type(document_type.id), 0);
}
