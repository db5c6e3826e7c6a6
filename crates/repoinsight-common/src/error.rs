//! Stable error codes surfaced through task results and the HTTP API
//!
//! Each crate defines its own `thiserror` enum; errors that cross the
//! task boundary map to one of these codes so clients can match on a
//! stable string instead of a formatted message.

use serde::{Deserialize, Serialize};

/// Error taxonomy carried in task results and status payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// URL fails GitHub-URL validation
    InvalidRepositoryUrl,
    /// Network or protocol error from the clone
    CloneFailed,
    /// Embedding provider rejected credentials
    EmbeddingAuthError,
    /// Exhausted retry budget on 429-class failures
    EmbeddingRateLimited,
    /// Other transient embedding failure after retries
    EmbeddingTransient,
    /// Cannot reach or create a vector collection
    VectorStoreUnavailable,
    /// Query precondition: no matching session
    SessionNotFound,
    /// Query precondition: session exists but is not terminal success
    SessionNotReady,
    /// Cooperative cancellation observed
    TaskCancelled,
    /// Anything else, message preserved alongside
    InternalError,
}

impl ErrorCode {
    /// The stable wire representation of this code
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRepositoryUrl => "InvalidRepositoryURL",
            Self::CloneFailed => "CloneFailed",
            Self::EmbeddingAuthError => "EmbeddingAuthError",
            Self::EmbeddingRateLimited => "EmbeddingRateLimited",
            Self::EmbeddingTransient => "EmbeddingTransient",
            Self::VectorStoreUnavailable => "VectorStoreUnavailable",
            Self::SessionNotFound => "SessionNotFound",
            Self::SessionNotReady => "SessionNotReady",
            Self::TaskCancelled => "TaskCancelled",
            Self::InternalError => "InternalError",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that know which taxonomy code they map to.
pub trait CodedError: std::error::Error {
    /// Stable code for this error
    fn code(&self) -> ErrorCode;
}
