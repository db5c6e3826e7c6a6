//! Error types for the metadata store

use thiserror::Error;

/// Result type alias for metadata operations
pub type MetaDataResult<T> = Result<T, MetaDataError>;

/// Errors raised by the session/file/query-log store
#[derive(Debug, Error)]
pub enum MetaDataError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row exists but holds data we cannot interpret
    #[error("Invalid row data: {0}")]
    InvalidData(String),

    /// Serialization of a JSON column failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Referenced session does not exist
    #[error("Session not found: {0}")]
    SessionNotFound(String),
}
