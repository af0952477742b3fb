//! Error types for the Vesper domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Failures never cross a
//! user-facing boundary as panics — the dispatcher and orchestrator
//! normalize everything into result values.

use thiserror::Error;

/// The top-level error type for all Vesper operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Inference backend errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Dispatch errors ---
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool in backoff: {tool_name} for another {remaining_ms}ms")]
    InBackoff { tool_name: String, remaining_ms: u64 },

    #[error("Tool retries exceeded: {tool_name} after {attempts} attempts")]
    RetriesExceeded { tool_name: String, attempts: u32 },

    #[error("Network unavailable for tool: {0}")]
    NetworkUnavailable(String),

    #[error("Tool timed out: {tool_name} after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),
}

impl ToolError {
    /// Whether this failure should count against the tool's retry budget.
    ///
    /// Synthetic refusals (unknown tool, backoff, missing capability, bad
    /// arguments) never invoked the tool, so they must not advance backoff.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ToolError::Timeout { .. } | ToolError::ExecutionFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("No handler registered for intent type: {0}")]
    UnknownIntent(String),

    #[error("Missing required entities: {prompt}")]
    MissingEntities { prompt: String },

    #[error("Handler failed for {kind}: {reason}")]
    HandlerFailed { kind: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_displays_correctly() {
        let err = Error::Backend(BackendError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::Timeout {
            tool_name: "web_search".into(),
            timeout_ms: 5000,
        });
        assert!(err.to_string().contains("web_search"));
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn retryable_classification() {
        assert!(
            ToolError::ExecutionFailed {
                tool_name: "t".into(),
                reason: "boom".into()
            }
            .retryable()
        );
        assert!(
            ToolError::Timeout {
                tool_name: "t".into(),
                timeout_ms: 100
            }
            .retryable()
        );
        assert!(!ToolError::NotFound("t".into()).retryable());
        assert!(
            !ToolError::InBackoff {
                tool_name: "t".into(),
                remaining_ms: 500
            }
            .retryable()
        );
        assert!(!ToolError::NetworkUnavailable("t".into()).retryable());
        assert!(!ToolError::CapabilityUnavailable("haptics".into()).retryable());
    }
}
