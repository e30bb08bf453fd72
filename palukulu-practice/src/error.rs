//! Error types for palukulu-practice
//!
//! Startup-fatal: [`CatalogError`]. Recoverable per submission:
//! [`PracticeError::TranscriptionUnavailable`] (nothing logged) and
//! [`PracticeError::Persistence`] (result computed, not saved).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::session::AttemptResult;

/// Proverb catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Backing file missing or malformed
    #[error("Catalog load failed: {0}")]
    Load(String),

    /// No proverbs to pick from
    #[error("Catalog is empty")]
    Empty,
}

/// Attempt log write/read errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored record could not be mapped back to an attempt
    #[error("Corrupt attempt record: {0}")]
    Corrupt(String),

    /// Lock retries exhausted
    #[error("Attempt log busy: {0}")]
    Busy(String),
}

/// Errors from one practice turn
#[derive(Debug, Error)]
pub enum PracticeError {
    /// Hard transcription failure or timeout; the attempt was not logged
    #[error("Transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    /// Scoring succeeded but the attempt could not be persisted after a retry
    #[error("Result computed but not saved: {source}")]
    Persistence {
        result: AttemptResult,
        #[source]
        source: PersistenceError,
    },

    /// The session is already scoring a submission
    #[error("A submission is already being scored for this session")]
    SubmissionInProgress,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Failures of the auxiliary classifier and synthesis services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., submission already being scored
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Service unavailable (503) - try again later
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Upstream service failed (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Result computed but not saved (500, result included in body)
    #[error("Result computed but not saved: {message}")]
    NotSaved {
        message: String,
        result: AttemptResult,
    },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// palukulu-common error
    #[error("Common error: {0}")]
    Common(#[from] palukulu_common::Error),
}

impl From<PracticeError> for ApiError {
    fn from(err: PracticeError) -> Self {
        match err {
            PracticeError::TranscriptionUnavailable(msg) => ApiError::Unavailable(format!(
                "Could not transcribe the recording, please try again ({})",
                msg
            )),
            PracticeError::Persistence { result, source } => ApiError::NotSaved {
                message: source.to_string(),
                result,
            },
            PracticeError::SubmissionInProgress => ApiError::Conflict(
                "A submission is already being scored for this session".to_string(),
            ),
            PracticeError::Catalog(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotConfigured(msg) => ApiError::Unavailable(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, result) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg, None)
            }
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg, None),
            ApiError::NotSaved { message, result } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOT_SAVED",
                format!("Your result was computed but not saved: {}", message),
                Some(result),
            ),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg, None)
            }
            ApiError::Persistence(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_ERROR",
                err.to_string(),
                None,
            ),
            ApiError::Common(palukulu_common::Error::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None)
            }
            ApiError::Common(palukulu_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
                None,
            ),
        };

        let body = match result {
            Some(result) => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                },
                "result": result,
            }),
            None => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
