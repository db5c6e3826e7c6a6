//! Error types for the vector store adapter

use repoinsight_common::{error::CodedError, ErrorCode};
use thiserror::Error;

/// Result type alias for vector store operations
pub type VectorDataResult<T> = Result<T, VectorDataError>;

/// Errors raised by vector storage backends
#[derive(Debug, Error)]
pub enum VectorDataError {
    /// Cannot reach the store or establish a connection
    #[error("Vector store unavailable: {0}")]
    Unavailable(String),

    /// A storage operation against an existing connection failed
    #[error("Vector store operation failed: {0}")]
    Storage(String),

    /// Referenced collection does not exist
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Batch shape problem (chunk/embedding count or dimension mismatch)
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),
}

impl CodedError for VectorDataError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) | Self::CollectionNotFound(_) => ErrorCode::VectorStoreUnavailable,
            Self::Storage(_) | Self::InvalidBatch(_) => ErrorCode::InternalError,
        }
    }
}
