//! Error types for LLM completion

use thiserror::Error;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors raised by chat providers
#[derive(Debug, Error)]
pub enum LlmError {
    /// Requested provider name is not in the registry
    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    /// Provider configuration is incomplete
    #[error("LLM configuration error: {0}")]
    Config(String),

    /// The completion request failed
    #[error("LLM request failed: {0}")]
    Request(String),

    /// The response could not be interpreted
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}
