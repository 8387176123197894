//! Error types for supctl-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use supctl_core::{EmitError, ScanError, StoreError, TableError};
use supctl_platform::PlatformError;
use thiserror::Error;

/// Plain-text body returned for requests that are not JSON
pub const UNSUPPORTED_CONTENT_TYPE: &str = "Unsupported Content Type. Please use application/json";

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Platform connection error
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while processing one notified file
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File could not be retrieved from the platform
    #[error("File retrieval failed: {0}")]
    Retrieval(#[from] PlatformError),

    /// Retrieved file is not a well-formed table
    #[error("Unreadable table: {0}")]
    Table(#[from] TableError),

    /// Role cache could not be updated
    #[error("Pairing store error: {0}")]
    Store(#[from] StoreError),

    /// Scan aborted on misconfigured or non-numeric data
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    /// Artifact or report could not be written
    #[error("Emission failed: {0}")]
    Emit(#[from] EmitError),
}

impl PipelineError {
    /// Whether the failure lies with an external collaborator rather than
    /// with configuration or local data.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, PipelineError::Retrieval(_))
    }
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body is not declared as JSON
    #[error("Unsupported Content Type. Please use application/json")]
    UnsupportedContentType,

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Pipeline failure surfaced to the caller
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::UnsupportedContentType => {
                return (StatusCode::BAD_REQUEST, UNSUPPORTED_CONTENT_TYPE).into_response();
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Pipeline(PipelineError::Scan(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SCAN_ERROR")
            }
            ApiError::Pipeline(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_ERROR"),
        };

        let details = match &self {
            ApiError::Pipeline(PipelineError::Scan(ScanError::Coercion { column, row, raw })) => {
                Some(serde_json::json!({ "column": column, "row": row, "raw": raw }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
