use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lab_common::storage::StorageError;
use sea_orm::{ConnAcquireErr, DbErr};
use serde::Serialize;

use crate::content::ContentError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`, `PAYLOAD_TOO_LARGE`,
    /// `UPSTREAM_TIMEOUT`, `STORAGE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Publication title must not be empty")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    NotFound(String),
    PayloadTooLarge { limit: u64 },
    UpstreamTimeout(String),
    /// Read/write fault in the document store or blob store.
    Storage(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "PAYLOAD_TOO_LARGE",
                    message: format!("Upload exceeds maximum size of {limit} bytes"),
                },
            ),
            AppError::UpstreamTimeout(detail) => {
                tracing::warn!("Upstream timeout: {}", detail);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorBody {
                        code: "UPSTREAM_TIMEOUT",
                        message: "The storage backend did not respond in time".into(),
                    },
                )
            }
            AppError::Storage(detail) => {
                tracing::error!("Storage failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_ERROR",
                        message: "The operation could not be saved".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => {
                AppError::UpstreamTimeout(err.to_string())
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("File '{key}' not found")),
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            StorageError::SizeLimitExceeded { limit, .. } => AppError::PayloadTooLarge { limit },
            StorageError::Io(e) => AppError::Storage(e.to_string()),
        }
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        AppError::Storage(err.to_string())
    }
}
