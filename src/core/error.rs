//! Error type system for Article Board
//!
//! This module provides the error taxonomy shared by services and handlers:
//! - Validation, authentication, authorization and not-found classes
//! - Storage and hashing failures that are logged but never leaked
//! - HTTP status code mapping and JSON error responses with trace IDs

use crate::api::middleware::trace::current_trace_id;
use crate::core::validation::ValidationErrors;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Message shown to clients for every internal failure
pub const GENERIC_FAILURE_MESSAGE: &str = "An internal error occurred.";

/// Main error type for the Article Board system
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    // Storage errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Task error: {0}")]
    TaskError(String),

    // Request errors
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // Credential errors
    #[error("Password hashing error: {0}")]
    HashError(String),

    #[error("Session token error: {0}")]
    TokenError(String),

    // I/O errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BoardError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            BoardError::Validation(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            BoardError::AuthenticationError(_) | BoardError::TokenError(_) => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            BoardError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            BoardError::NotFound(_) => StatusCode::NOT_FOUND,

            // 408 Request Timeout
            BoardError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,

            // 500 Internal Server Error
            BoardError::DatabaseError(_)
            | BoardError::PoolError(_)
            | BoardError::StorageError(_)
            | BoardError::TaskError(_)
            | BoardError::HashError(_)
            | BoardError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            BoardError::DatabaseError(_) => "DatabaseError",
            BoardError::PoolError(_) => "PoolError",
            BoardError::StorageError(_) => "StorageError",
            BoardError::TaskError(_) => "TaskError",
            BoardError::Validation(_) => "ValidationError",
            BoardError::AuthenticationError(_) => "AuthenticationError",
            BoardError::PermissionDenied(_) => "PermissionDenied",
            BoardError::NotFound(_) => "NotFound",
            BoardError::Timeout(_) => "Timeout",
            BoardError::HashError(_) => "HashError",
            BoardError::TokenError(_) => "TokenError",
            BoardError::IoError(_) => "IoError",
        }
    }

    /// Check if this error is retryable
    ///
    /// Only transient storage failures (a busy or locked database, an
    /// exhausted pool, a timeout) get a second attempt. SQL and constraint
    /// errors fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            BoardError::DatabaseError(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            BoardError::PoolError(_) | BoardError::StorageError(_) | BoardError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Whether the error detail must be hidden from clients
    pub fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Message safe to show to a client
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response tagged with the current request's trace ID
    ///
    /// Outside a traced request a fresh ID is generated.
    pub fn new(error: String, message: String) -> Self {
        let trace_id = current_trace_id().unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            error,
            message,
            details: None,
            trace_id,
        }
    }

    /// Create an error response from a BoardError
    ///
    /// Internal failures carry the generic message; validation failures carry
    /// the field error list as details.
    pub fn from_error(error: &BoardError) -> Self {
        let mut response = Self::new(error.error_type().to_string(), error.public_message());
        if let BoardError::Validation(errors) = error {
            response.details = serde_json::to_value(errors).ok();
        }
        response
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} (trace_id: {})",
            self.error,
            self.message,
            self.details.as_ref().map_or("", |_| "with details"),
            self.trace_id
        )
    }
}

/// Implement IntoResponse for BoardError to enable automatic error handling in Axum
impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if self.is_internal() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with BoardError
pub type Result<T> = std::result::Result<T, BoardError>;
