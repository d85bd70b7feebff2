//! Error types for the dataset client.

use crate::config::RetryConfig;

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Errors raised while fetching from the dataset endpoint.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The attempt exceeded its deadline.
    #[error("Request timed out")]
    Timeout,

    /// The caller cancelled the request.
    #[error("Request was cancelled")]
    Cancelled,

    /// Connection-level failure.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("HTTP error (status {status})")]
    Status { status: u16, body: String },

    /// The body was not a valid dataset payload.
    #[error("Invalid response payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured endpoint is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

impl UpstreamError {
    /// Classify a transport failure from reqwest.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }

    /// Check if this error is retryable under the given policy.
    pub fn is_retryable(&self, retry: &RetryConfig) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Status { status, .. } => retry.should_retry_status(*status),
            _ => false,
        }
    }

    /// HTTP status, when upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
