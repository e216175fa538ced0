mod common;

use axum::http::{header, StatusCode};
use common::{pdf, TestApp, ADMIN_TOKEN, USER_TOKEN};
use docvault::core::Config;
use docvault::ingest::inspect::checksum;
use docvault::security::{ObjectRef, Permission};
use std::time::Duration;

fn files_url(document_id: impl std::fmt::Display) -> String {
    format!("/api/v4/documents/{}/files/", document_id)
}

/// Upload `content` as the admin and return the new file id
async fn upload_as_admin(app: &TestApp, document_id: u64, content: &[u8]) -> u64 {
    let response = app
        .post_bytes(
            &format!("{}?filename=scan.pdf", files_url(document_id)),
            ADMIN_TOKEN,
            content,
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    response.json()["file"]["id"].as_u64().unwrap()
}

#[tokio::test]
async fn test_upload_without_permission() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");

    let response = app
        .post_bytes(
            &format!("{}?filename=invoice.pdf", files_url(document.id)),
            USER_TOKEN,
            &pdf(2),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.state.catalog.files_of(document.id).is_empty());
}

#[tokio::test]
async fn test_upload_with_access() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    app.grant(document.object_ref(), Permission::DocumentFileNew);
    let content = pdf(3);

    let response = app
        .post_bytes(
            &format!("{}?filename=invoice.pdf&comment=rescan", files_url(document.id)),
            USER_TOKEN,
            &content,
        )
        .await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    let body = response.json();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["size"], content.len() as u64);

    let files = app.state.catalog.files_of(document.id);
    assert_eq!(files.len(), 1);
    let file = &files[0];
    assert_eq!(file.filename, "invoice.pdf");
    assert_eq!(file.comment, "rescan");
    assert_eq!(file.mimetype, "application/pdf");
    assert_eq!(file.encoding, "binary");
    assert_eq!(file.size, content.len() as u64);
    assert_eq!(file.checksum, checksum(&content));
    assert_eq!(app.state.catalog.page_count(document.id), 3);
    assert_eq!(app.state.catalog.pages_of(file.id).len(), 3);
}

#[tokio::test]
async fn test_upload_requires_filename() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");

    let response = app.post_bytes(&files_url(document.id), ADMIN_TOKEN, b"hello").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["filename"].is_array());
}

#[tokio::test]
async fn test_upload_to_missing_document() {
    let app = TestApp::new();
    let response = app
        .post_bytes(&format!("{}?filename=a.txt", files_url(404)), ADMIN_TOKEN, b"x")
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_without_access() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    let file_id = upload_as_admin(&app, document.id.0, &pdf(1)).await;

    let response = app
        .get(&format!("{}{}/download/", files_url(document.id), file_id), USER_TOKEN)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["detail"], "Not found.");
}

#[tokio::test]
async fn test_download_with_access() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    let content = pdf(2);
    let file_id = upload_as_admin(&app, document.id.0, &content).await;
    app.grant(document.object_ref(), Permission::DocumentFileDownload);

    let response = app
        .get(&format!("{}{}/download/", files_url(document.id), file_id), USER_TOKEN)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), content.as_slice());
    assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");

    let file = app.state.catalog.latest_file(document.id).unwrap();
    let expected = format!(
        "attachment; filename=\"{}\"",
        file.rendered_filename(&document.label, false)
    );
    assert_eq!(response.header(header::CONTENT_DISPOSITION), expected);
}

#[tokio::test]
async fn test_download_detects_altered_blob() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    let file_id = upload_as_admin(&app, document.id.0, &pdf(2)).await;
    let file = app.state.catalog.latest_file(document.id).unwrap();
    app.state
        .files
        .put(&file.storage_key, bytes::Bytes::from_static(b"tampered"))
        .unwrap();

    let response = app
        .get(&format!("{}{}/download/", files_url(document.id), file_id), ADMIN_TOKEN)
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["detail"], "Internal server error.");
}

#[tokio::test]
async fn test_download_preserve_extension() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    let file_id = upload_as_admin(&app, document.id.0, &pdf(1)).await;

    let response = app
        .get(
            &format!(
                "{}{}/download/?preserve_extension=true",
                files_url(document.id),
                file_id
            ),
            ADMIN_TOKEN,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let file = app.state.catalog.latest_file(document.id).unwrap();
    let disposition = response.header(header::CONTENT_DISPOSITION);
    assert_eq!(
        disposition,
        format!(
            "attachment; filename=\"invoice ({}).pdf\"",
            file.rendered_timestamp()
        )
    );
}

#[tokio::test]
async fn test_access_inherited_from_document_type() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");
    let document = app.document(&document_type, "invoice.pdf");
    let file_id = upload_as_admin(&app, document.id.0, b"plain text").await;
    app.grant(
        ObjectRef::DocumentType(document_type.id),
        Permission::DocumentFileDownload,
    );

    let response = app
        .get(&format!("{}{}/download/", files_url(document.id), file_id), USER_TOKEN)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), b"plain text");
}

#[tokio::test]
async fn test_list_without_access() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    upload_as_admin(&app, document.id.0, b"first").await;

    let response = app.get(&files_url(document.id), USER_TOKEN).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["count"], 0);
}

#[tokio::test]
async fn test_list_with_access() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    upload_as_admin(&app, document.id.0, b"first").await;
    upload_as_admin(&app, document.id.0, b"second").await;
    app.grant(document.object_ref(), Permission::DocumentFileView);

    let response = app.get(&files_url(document.id), USER_TOKEN).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    let latest = app.state.catalog.latest_file(document.id).unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][1]["checksum"], latest.checksum.as_str());
    assert_eq!(body["results"][1]["checksum"], checksum(b"second").as_str());
}

#[tokio::test]
async fn test_list_missing_document() {
    let app = TestApp::new();
    let response = app.get(&files_url(77), ADMIN_TOKEN).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_without_access() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    upload_as_admin(&app, document.id.0, b"first").await;
    let file_id = upload_as_admin(&app, document.id.0, b"second").await;

    let response = app
        .delete(&format!("{}{}/", files_url(document.id), file_id), USER_TOKEN)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.catalog.files_of(document.id).len(), 2);
}

#[tokio::test]
async fn test_delete_with_access() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    upload_as_admin(&app, document.id.0, b"first").await;
    let file_id = upload_as_admin(&app, document.id.0, b"second").await;
    app.grant(document.object_ref(), Permission::DocumentFileDelete);
    let deleted = app.state.catalog.latest_file(document.id).unwrap();

    let response = app
        .delete(&format!("{}{}/", files_url(document.id), file_id), USER_TOKEN)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let files = app.state.catalog.files_of(document.id);
    assert_eq!(files.len(), 1);
    assert_eq!(app.state.catalog.latest_file(document.id).unwrap(), files[0]);
    assert!(!app.state.files.exists(&deleted.storage_key));
}

#[tokio::test]
async fn test_file_detail_and_pages() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");
    let file_id = upload_as_admin(&app, document.id.0, &pdf(4)).await;
    let file_url = format!("{}{}/", files_url(document.id), file_id);

    let hidden = app.get(&file_url, USER_TOKEN).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    app.grant(document.object_ref(), Permission::DocumentFileView);
    let detail = app.get(&file_url, USER_TOKEN).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.json()["page_count"], 4);
    assert!(detail.json().get("storage_key").is_none());

    let pages = app.get(&format!("{}pages/", file_url), USER_TOKEN).await;
    assert_eq!(pages.status, StatusCode::OK);
    let pages = pages.json();
    assert_eq!(pages["count"], 4);
    assert_eq!(pages["results"][0]["page_number"], 1);

    let page_id = pages["results"][3]["id"].as_u64().unwrap();
    let page = app
        .get(&format!("{}pages/{}/", file_url, page_id), USER_TOKEN)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.json()["page_number"], 4);
}

#[tokio::test]
async fn test_file_of_other_document_is_hidden() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");
    let first = app.document(&document_type, "first");
    let second = app.document(&document_type, "second");
    let file_id = upload_as_admin(&app, first.id.0, b"content").await;

    let response = app
        .get(&format!("{}{}/", files_url(second.id), file_id), ADMIN_TOKEN)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_token() {
    let app = TestApp::new();
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");

    let response = app
        .send(
            axum::http::Method::GET,
            &files_url(document.id),
            None,
            None,
            axum::body::Body::empty(),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.get(&files_url(document.id), "wrong-token").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_background_upload() {
    let app = TestApp::with_config(Config::default());
    let document = app.document(&app.document_type("Invoices"), "invoice.pdf");

    let response = app
        .post_bytes(
            &format!("{}?filename=later.txt", files_url(document.id)),
            ADMIN_TOKEN,
            b"processed later",
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.json()["status"], "queued");

    let mut files = Vec::new();
    for _ in 0..100 {
        files = app.state.catalog.files_of(document.id);
        if !files.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].checksum, checksum(b"processed later"));
}
