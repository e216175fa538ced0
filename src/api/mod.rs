//! # API Module
//!
//! HTTP interface of Docvault. Every route below [`API_BASE`] except the
//! health and info endpoints requires `Authorization: Token <token>`.
//!
//! ## Endpoints Overview
//!
//! ### Document types
//! - `GET|POST /api/v4/document_types/`
//! - `GET|PUT|PATCH|DELETE /api/v4/document_types/{id}/`
//!
//! ### Documents
//! - `GET|POST /api/v4/documents/`
//! - `POST /api/v4/documents/upload/` - Create a document from a file
//! - `GET|PUT|PATCH /api/v4/documents/{id}/`
//! - `DELETE /api/v4/documents/{id}/` - Move to trash
//! - `GET /api/v4/trashed_documents/`
//! - `GET|DELETE /api/v4/trashed_documents/{id}/`
//! - `POST /api/v4/trashed_documents/{id}/restore/`
//!
//! ### Document files
//! - `GET|POST /api/v4/documents/{id}/files/`
//! - `GET|DELETE /api/v4/documents/{id}/files/{file_id}/`
//! - `GET /api/v4/documents/{id}/files/{file_id}/download/`
//! - `GET /api/v4/documents/{id}/files/{file_id}/pages/`
//! - `GET /api/v4/documents/{id}/files/{file_id}/pages/{page_id}/`
//!
//! ### Access control
//! - `GET /api/v4/permissions/`
//! - `GET|POST /api/v4/{documents,document_types}/{id}/acls/`
//! - `POST /api/v4/{documents,document_types}/{id}/acls/revoke/`
//!
//! ### System Essentials
//! - `GET /api/v4/health/` - Health check
//! - `GET /api/v4/info/` - Service info
//! - `GET /metrics` - Prometheus metrics

pub mod auth;
pub mod handlers;
pub mod pagination;
pub mod server;

/// Prefix of every REST route
pub const API_BASE: &str = "/api/v4";

// Re-export commonly used items
pub use auth::AuthUser;
pub use pagination::{Page, PaginationQueryParams};
pub use server::{create_app, start_server};
