//! Error types and failure classification for embedding operations

use repoinsight_common::{error::CodedError, ErrorCode};
use thiserror::Error;

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors raised by embedding providers and the batch processor
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Requested provider name is not in the registry
    #[error("Unsupported embedding provider: {0}")]
    UnsupportedProvider(String),

    /// Provider configuration is incomplete or contradictory
    #[error("Embedding configuration error: {0}")]
    Config(String),

    /// Provider rejected the credentials; retrying will not help
    #[error("Embedding authentication failed: {0}")]
    Auth(String),

    /// 429-class failure after the retry budget was exhausted
    #[error("Embedding rate limited: {0}")]
    RateLimited(String),

    /// Transient failure (network, 5xx) after the retry budget
    #[error("Transient embedding failure: {0}")]
    Transient(String),

    /// Provider returned a different number of vectors than inputs
    #[error("Embedding count mismatch: requested {requested}, received {received}")]
    CountMismatch { requested: usize, received: usize },

    /// Anything the classifier could not place
    #[error("Embedding failed: {0}")]
    Fatal(String),
}

impl CodedError for EmbeddingError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Auth(_) => ErrorCode::EmbeddingAuthError,
            Self::RateLimited(_) => ErrorCode::EmbeddingRateLimited,
            Self::Transient(_) => ErrorCode::EmbeddingTransient,
            _ => ErrorCode::InternalError,
        }
    }
}

/// Classification of a provider failure, driving the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retry with a lengthened backoff
    RateLimit,
    /// Fail immediately, no retry
    AuthError,
    /// Retry with the normal backoff
    Transient,
    /// Fail immediately
    Fatal,
}

const RATE_LIMIT_INDICATORS: &[&str] = &[
    "rate limit",
    "too many requests",
    "quota exceeded",
    "429",
    "rate_limit_exceeded",
];

const AUTH_INDICATORS: &[&str] = &[
    "api key",
    "invalid key",
    "unauthorized",
    "401",
    "403",
    "authentication",
    "invalid_api_key",
];

const TRANSIENT_INDICATORS: &[&str] = &[
    "timeout",
    "timed out",
    "connection",
    "temporarily unavailable",
    "500",
    "502",
    "503",
    "504",
    "server error",
    "overloaded",
];

/// Classify a failure by matching its text against known indicators.
pub fn classify_failure(message: &str) -> FailureKind {
    let lowered = message.to_lowercase();
    if RATE_LIMIT_INDICATORS.iter().any(|m| lowered.contains(m)) {
        FailureKind::RateLimit
    } else if AUTH_INDICATORS.iter().any(|m| lowered.contains(m)) {
        FailureKind::AuthError
    } else if TRANSIENT_INDICATORS.iter().any(|m| lowered.contains(m)) {
        FailureKind::Transient
    } else {
        FailureKind::Fatal
    }
}
