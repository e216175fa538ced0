//! Error types and handling for Docvault
//!
//! Every failure a request can hit funnels into [`Error`]. The HTTP status
//! of each variant is decided here and nowhere else.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageFactoryError;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Docvault
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage layer errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The configured blob storage could not be opened
    #[error(transparent)]
    StorageInit(#[from] StorageFactoryError),

    /// The object does not exist, or the caller may not know that it exists
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller is known but the action is not granted
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// No valid credentials were supplied
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,

    /// Malformed request parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Field level validation failure
    #[error("Validation failed on `{field}`: {message}")]
    Validation {
        /// Name of the rejected field
        field: &'static str,
        /// Human readable reason
        message: String,
    },

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Blob storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// No blob stored under this key
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// Disk I/O operation failed
    #[error("Disk I/O failed: {0}")]
    DiskIo(#[from] std::io::Error),

    /// Stored bytes do not match the recorded checksum
    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a validation error for a named field
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::InvalidInput(_) | Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Storage(StorageError::BlobNotFound(_)) => StatusCode::NOT_FOUND,
            Error::Config(_)
            | Error::Storage(_)
            | Error::StorageInit(_)
            | Error::Internal(_)
            | Error::Io(_)
            | Error::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        // Do not leak internals to clients
        let detail = match &self {
            Error::NotFound(_) | Error::Storage(StorageError::BlobNotFound(_)) => {
                "Not found.".to_string()
            }
            e if e.is_server_error() => "Internal server error.".to_string(),
            e => e.to_string(),
        };

        let body = match &self {
            Error::Validation { field, message } => {
                let mut fields = serde_json::Map::new();
                fields.insert(field.to_string(), json!([message]));
                serde_json::Value::Object(fields)
            }
            _ => json!({ "detail": detail }),
        };

        (status, Json(body)).into_response()
    }
}
