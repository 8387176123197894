//! Error types for the platform client

use thiserror::Error;

/// Platform client errors
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The platform answered with `isError: true`
    #[error("Platform error: {0}")]
    Platform(String),

    /// A named container, data source or file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid base URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Local IO failure (downloads)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlatformError {
    /// Whether a retry may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            PlatformError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            PlatformError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result alias for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;
