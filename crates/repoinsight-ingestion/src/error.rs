//! Error types for the ingestion pipeline

use repoinsight_common::{error::CodedError, ErrorCode};
use thiserror::Error;

/// Result type alias for ingestion operations
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Errors raised by the ingestion pipeline.
///
/// Phase-boundary failures (session setup, embedder construction,
/// collection creation, clone) surface as these variants and mark the
/// session failed. Per-file and per-batch failures are recorded on the
/// session instead and never reach this type.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// URL fails GitHub-URL validation
    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    /// Network or protocol error from the clone
    #[error("Clone failed: {0}")]
    CloneFailed(String),

    /// Embedder construction or the credential probe failed
    #[error(transparent)]
    Embedding(#[from] repoinsight_embeddings::EmbeddingError),

    /// Vector store failure during setup
    #[error(transparent)]
    VectorStore(#[from] repoinsight_vector_data::VectorDataError),

    /// Session store failure
    #[error(transparent)]
    MetaData(#[from] repoinsight_meta_data::MetaDataError),

    /// Repository scan failure
    #[error(transparent)]
    Scan(#[from] repoinsight_parsing::ParsingError),

    /// Cooperative cancellation observed at a checkpoint
    #[error("Task cancelled")]
    Cancelled,
}

impl CodedError for IngestionError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRepositoryUrl(_) => ErrorCode::InvalidRepositoryUrl,
            Self::CloneFailed(_) => ErrorCode::CloneFailed,
            Self::Embedding(e) => e.code(),
            Self::VectorStore(e) => e.code(),
            Self::Cancelled => ErrorCode::TaskCancelled,
            Self::MetaData(_) | Self::Scan(_) => ErrorCode::InternalError,
        }
    }
}
