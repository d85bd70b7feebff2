//! Errors raised by tool dispatch.

use traktamente_core::UpstreamError;

/// Errors that can occur while dispatching a tool call.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments failed shape or range checks. Raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// No tool with this name exists.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The dataset request failed.
    #[error("{operation} failed: {source}")]
    Upstream {
        operation: &'static str,
        #[source]
        source: UpstreamError,
    },

    /// The result could not be serialized.
    #[error("Failed to render response: {0}")]
    Render(#[from] serde_json::Error),
}

impl ToolError {
    /// Actionable message for the calling agent. Never includes internal detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::UnknownTool(name) => format!("Unknown tool: {}", name),
            Self::Render(_) => "Failed to render the response. Try again with a smaller limit.".to_string(),
            Self::Upstream { operation, source } => upstream_message(operation, source),
        }
    }
}

fn upstream_message(operation: &str, error: &UpstreamError) -> String {
    match error {
        UpstreamError::Timeout | UpstreamError::Cancelled => format!(
            "{} timed out. The Skatteverket API may be slow. Try again or reduce the limit parameter.",
            operation
        ),
        UpstreamError::Status { status, .. } => match status {
            404 => format!(
                "{} returned no data. Verify the query parameters are valid.",
                operation
            ),
            429 => format!(
                "{} was rate limited. Please wait before making more requests.",
                operation
            ),
            500..=599 => format!(
                "{} failed due to a server error. The Skatteverket API may be temporarily unavailable. Try again later.",
                operation
            ),
            other => format!(
                "{} failed: Skatteverket API returned HTTP {}",
                operation, other
            ),
        },
        UpstreamError::Network(_) => format!(
            "{} failed: could not reach the Skatteverket API. Check connectivity and try again.",
            operation
        ),
        UpstreamError::Parse(_) => format!(
            "{} failed: the Skatteverket API returned an unexpected response. Try again later.",
            operation
        ),
        UpstreamError::InvalidUrl(_) | UpstreamError::Client(_) => format!(
            "{} failed: the server is misconfigured. Check the upstream settings.",
            operation
        ),
    }
}
