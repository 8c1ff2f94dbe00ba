//! Unified error handling for callers of the catalog store.
//!
//! Provides an `AppError` type that a transport layer can return from its
//! handlers. Every variant maps to one [`ErrorKind`], and the kind alone
//! decides the status code and whether the message reaches the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use catalog_core::{ErrorKind, ValidationErrors};

use crate::db::RepositoryError;

/// Application-level error type for catalog operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Domain validation rejected the product before it was written.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller may not act on this shop.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Domain classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Repository(err) => err.kind(),
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Repository(err) => err.code(),
            Self::Validation(_) => "invalid_product".to_owned(),
            Self::Unauthorized(_) => "unauthorized".to_owned(),
            Self::Forbidden(_) => "forbidden".to_owned(),
            Self::Internal(_) => "internal_error".to_owned(),
        }
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let message = if kind.is_client_visible() {
            self.to_string()
        } else {
            tracing::error!(error = %self, "Request error");
            "Internal server error".to_owned()
        };

        let status =
            StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            code: if kind.is_client_visible() {
                self.code()
            } else {
                "internal_error".to_owned()
            },
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
