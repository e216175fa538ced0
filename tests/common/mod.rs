//! Shared harness for the HTTP integration tests

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use docvault::api::create_app;
use docvault::core::documents::{Document, DocumentType};
use docvault::core::Config;
use docvault::security::{ObjectRef, Permission, User};
use docvault::storage::{NewDocument, SharedFileStorage};
use docvault::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_TOKEN: &str = "user-token";

/// Router plus direct access to the state behind it
pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    pub admin: User,
    pub user: User,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

impl TestApp {
    /// Uploads are processed inside the request
    pub fn new() -> Self {
        let mut config = Config::default();
        config.ingest.eager = true;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        Self::from_state(AppState::new(config).unwrap())
    }

    /// Eager uploads over a caller supplied blob storage
    pub fn with_file_storage(files: SharedFileStorage) -> Self {
        let mut config = Config::default();
        config.ingest.eager = true;
        Self::from_state(AppState::with_file_storage(config, files).unwrap())
    }

    fn from_state(state: AppState) -> Self {
        let state = Arc::new(state);
        let admin = state.create_user("admin", Some(ADMIN_TOKEN.into()), true, &[]).unwrap();
        let user = state.create_user("alice", Some(USER_TOKEN.into()), false, &[]).unwrap();
        let router = create_app(state.clone());
        Self {
            state,
            router,
            admin,
            user,
        }
    }

    pub fn grant(&self, object: ObjectRef, permission: Permission) {
        self.state.acl.grant_access(self.user.id, object, permission);
    }

    pub fn grant_global(&self, permission: Permission) {
        self.state.acl.grant_permission(self.user.id, permission);
    }

    pub fn document_type(&self, label: &str) -> DocumentType {
        self.state.catalog.create_document_type(label).unwrap()
    }

    pub fn document(&self, document_type: &DocumentType, label: &str) -> Document {
        self.state
            .catalog
            .create_document(NewDocument {
                document_type_id: document_type.id,
                label: label.into(),
                description: None,
                language: None,
            })
            .unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: Body,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(body).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None, Body::empty()).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None, Body::empty()).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        payload: Value,
    ) -> TestResponse {
        self.send(
            method,
            uri,
            Some(token),
            Some("application/json"),
            Body::from(payload.to_string()),
        )
        .await
    }

    pub async fn post_bytes(&self, uri: &str, token: &str, content: &[u8]) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some(token),
            Some("application/octet-stream"),
            Body::from(content.to_vec()),
        )
        .await
    }
}

/// A minimal PDF with `pages` page objects
pub fn pdf(pages: usize) -> Vec<u8> {
    let mut body = String::from("%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    let kids: Vec<String> = (0..pages).map(|n| format!("{} 0 R", n + 3)).collect();
    body.push_str(&format!(
        "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
        kids.join(" "),
        pages
    ));
    for n in 0..pages {
        body.push_str(&format!(
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n",
            n + 3
        ));
    }
    body.push_str("trailer\n<< /Root 1 0 R >>\n%%EOF\n");
    body.into_bytes()
}
