//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::FieldErrors;
use crate::security::HashingError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(FieldErrors),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Configuration defects (5xx)
    #[error("No handler registered for {request_type}")]
    UnregisteredHandler { request_type: &'static str },

    #[error("More than one handler registered for {request_type}")]
    AmbiguousHandler { request_type: &'static str },

    // Server errors (5xx)
    #[error("Password hashing failed: {0}")]
    HashingFailure(#[from] HashingError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Conflict on a single field
    pub fn conflict(field: &'static str) -> Self {
        AppError::Conflict(FieldErrors::single(field, "has already been taken"))
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Conflict(_)
                | Self::InvalidCredentials
                | Self::InvalidRequest(_)
        )
    }

    /// Field errors carried by validation and conflict failures
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) | Self::Conflict(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),

            // 401 Unauthorized
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),

            // 409 Conflict
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),

            // 422 Unprocessable Entity
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),

            // 500 Internal Server Error
            AppError::UnregisteredHandler { request_type } => {
                tracing::error!(request_type, "No handler registered");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::AmbiguousHandler { request_type } => {
                tracing::error!(request_type, "Ambiguous handler registration");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::HashingFailure(e) => {
                tracing::error!("Hashing failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error")
            }
        };

        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            errors: self.field_errors().cloned(),
        };

        (status, Json(body)).into_response()
    }
}
