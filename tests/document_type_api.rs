mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN_TOKEN, USER_TOKEN};
use docvault::security::{ObjectRef, Permission};
use serde_json::json;

const LIST_URL: &str = "/api/v4/document_types/";

fn detail_url(id: impl std::fmt::Display) -> String {
    format!("{}{}/", LIST_URL, id)
}

#[tokio::test]
async fn test_create_without_permission() {
    let app = TestApp::new();

    let response = app
        .json(Method::POST, LIST_URL, USER_TOKEN, json!({ "label": "Invoices" }))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.state.catalog.document_types().len(), 0);
}

#[tokio::test]
async fn test_create_with_permission() {
    let app = TestApp::new();
    app.grant_global(Permission::DocumentTypeCreate);

    let response = app
        .json(Method::POST, LIST_URL, USER_TOKEN, json!({ "label": "Invoices" }))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["label"], "Invoices");
    assert_eq!(response.json()["documents_count"], 0);

    let types = app.state.catalog.document_types();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].label, "Invoices");
}

#[tokio::test]
async fn test_create_validation() {
    let app = TestApp::new();
    app.document_type("Invoices");

    let duplicate = app
        .json(Method::POST, LIST_URL, ADMIN_TOKEN, json!({ "label": "Invoices" }))
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert!(duplicate.json()["label"].is_array());

    let missing = app.json(Method::POST, LIST_URL, ADMIN_TOKEN, json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let blank = app
        .json(Method::POST, LIST_URL, ADMIN_TOKEN, json!({ "label": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.state.catalog.document_types().len(), 1);
}

#[tokio::test]
async fn test_view_requires_access() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");

    let hidden = app.get(&detail_url(document_type.id), USER_TOKEN).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    app.grant(
        ObjectRef::DocumentType(document_type.id),
        Permission::DocumentTypeView,
    );
    let visible = app.get(&detail_url(document_type.id), USER_TOKEN).await;
    assert_eq!(visible.status, StatusCode::OK);
    assert_eq!(visible.json()["id"], document_type.id.0);
}

#[tokio::test]
async fn test_list_is_filtered() {
    let app = TestApp::new();
    let invoices = app.document_type("Invoices");
    app.document_type("Receipts");
    app.grant(ObjectRef::DocumentType(invoices.id), Permission::DocumentTypeView);

    let response = app.get(LIST_URL, USER_TOKEN).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["label"], "Invoices");

    let admin = app.get(LIST_URL, ADMIN_TOKEN).await.json();
    assert_eq!(admin["count"], 2);
}

#[tokio::test]
async fn test_edit_without_access() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");

    for method in [Method::PUT, Method::PATCH] {
        let response = app
            .json(
                method,
                &detail_url(document_type.id),
                USER_TOKEN,
                json!({ "label": "Edited" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    let stored = app.state.catalog.document_type(document_type.id).unwrap();
    assert_eq!(stored.label, "Invoices");
}

#[tokio::test]
async fn test_edit_via_put() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");
    app.grant(
        ObjectRef::DocumentType(document_type.id),
        Permission::DocumentTypeEdit,
    );

    let response = app
        .json(
            Method::PUT,
            &detail_url(document_type.id),
            USER_TOKEN,
            json!({ "label": "Bills" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let stored = app.state.catalog.document_type(document_type.id).unwrap();
    assert_eq!(stored.label, "Bills");
}

#[tokio::test]
async fn test_edit_via_patch() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");
    app.grant(
        ObjectRef::DocumentType(document_type.id),
        Permission::DocumentTypeEdit,
    );

    let unchanged = app
        .json(Method::PATCH, &detail_url(document_type.id), USER_TOKEN, json!({}))
        .await;
    assert_eq!(unchanged.status, StatusCode::OK);
    assert_eq!(unchanged.json()["label"], "Invoices");

    let response = app
        .json(
            Method::PATCH,
            &detail_url(document_type.id),
            USER_TOKEN,
            json!({ "label": "Bills" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let stored = app.state.catalog.document_type(document_type.id).unwrap();
    assert_eq!(stored.label, "Bills");
}

#[tokio::test]
async fn test_put_requires_label() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");

    let response = app
        .json(Method::PUT, &detail_url(document_type.id), ADMIN_TOKEN, json!({}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_without_access() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");

    let response = app.delete(&detail_url(document_type.id), USER_TOKEN).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.catalog.document_types().len(), 1);
}

#[tokio::test]
async fn test_delete_with_access() {
    let app = TestApp::new();
    let document_type = app.document_type("Invoices");
    let document = app.document(&document_type, "invoice.pdf");
    app.grant(
        ObjectRef::DocumentType(document_type.id),
        Permission::DocumentTypeDelete,
    );
    app.grant(document.object_ref(), Permission::DocumentView);

    let response = app.delete(&detail_url(document_type.id), USER_TOKEN).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(app.state.catalog.document_types().is_empty());
    assert!(app.state.catalog.document(document.id).is_none());
    assert!(app.state.acl.grants_for(document.object_ref()).is_empty());
    assert!(app
        .state
        .acl
        .grants_for(ObjectRef::DocumentType(document_type.id))
        .is_empty());
}

#[tokio::test]
async fn test_missing_type() {
    let app = TestApp::new();
    let response = app.get(&detail_url(999), ADMIN_TOKEN).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
