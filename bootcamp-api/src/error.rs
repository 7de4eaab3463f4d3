//! Error types and HTTP response conversion
//!
//! Every failure a handler raises funnels through [`Error`]; its
//! `IntoResponse` impl is the single place errors are logged and rendered as
//! `{ "success": false, "message": ... }`.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::{RepositoryError, RepositoryErrorKind};

/// Error body sent to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,

    /// Human-readable message
    pub message: String,
}

impl ErrorResponse {
    /// Create an error body with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Structured repository error with operation context
    #[error("{0}")]
    Repository(RepositoryError),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(Box<axum::http::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Bad request
    #[error("{0}")]
    BadRequest(String),

    /// External service error (502)
    #[error("External service error: {0}")]
    External(String),

    /// Internal server error
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// HTTP status carried by this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Repository(e) => match e.kind {
                RepositoryErrorKind::NotFound => StatusCode::NOT_FOUND,
                RepositoryErrorKind::AlreadyExists | RepositoryErrorKind::ValidationFailed => {
                    StatusCode::BAD_REQUEST
                }
                RepositoryErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::External(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Http(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to clients
    pub fn client_message(&self) -> String {
        match self {
            Error::Repository(e) => match e.kind {
                RepositoryErrorKind::NotFound => match (&e.entity_type, &e.entity_id) {
                    (Some(entity_type), Some(entity_id)) => {
                        format!("{entity_type} not found with id of {entity_id}")
                    }
                    _ => "Resource not found".to_string(),
                },
                RepositoryErrorKind::AlreadyExists => "Duplicate field value entered".to_string(),
                RepositoryErrorKind::ValidationFailed => e.message.clone(),
                RepositoryErrorKind::Timeout => "Database operation timed out".to_string(),
                _ => "Server Error".to_string(),
            },
            Error::NotFound(msg) | Error::BadRequest(msg) | Error::Internal(msg) => msg.clone(),
            Error::External(_) => "Geocoding service unavailable".to_string(),
            Error::Config(_) | Error::Http(_) | Error::Io(_) => "Server Error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Error::Repository(e) => tracing::error!(
                operation = %e.operation,
                kind = %e.kind,
                entity_type = ?e.entity_type,
                entity_id = ?e.entity_id,
                retriable = e.is_retriable(),
                status = status.as_u16(),
                "Repository error: {}", e.message
            ),
            _ if status.is_server_error() => {
                tracing::error!(status = status.as_u16(), "{}", self)
            }
            _ => tracing::warn!(status = status.as_u16(), "{}", self),
        }

        (status, Json(ErrorResponse::new(self.client_message()))).into_response()
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        Error::Repository(err)
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<axum::http::Error> for Error {
    fn from(err: axum::http::Error) -> Self {
        Error::Http(Box::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::External(err.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        Error::BadRequest(err.body_text())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
