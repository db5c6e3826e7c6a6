//! Error types for the query service

use repoinsight_common::{error::CodedError, ErrorCode};
use thiserror::Error;

/// Result type alias for query operations
pub type QueryServiceResult<T> = Result<T, QueryError>;

/// Errors raised by the query path; surfaced verbatim (by code) in the
/// task result
#[derive(Debug, Error)]
pub enum QueryError {
    /// No session matches the given id or repository URL
    #[error("SessionNotFound")]
    SessionNotFound,

    /// A session exists but has not completed successfully
    #[error("SessionNotReady: status {0}")]
    SessionNotReady(String),

    /// Embedder construction or query embedding failed
    #[error(transparent)]
    Embedding(#[from] repoinsight_embeddings::EmbeddingError),

    /// Answer generation failed
    #[error(transparent)]
    Llm(#[from] repoinsight_llm::LlmError),

    /// Retrieval failed outside the tolerated per-leg errors
    #[error(transparent)]
    Search(#[from] repoinsight_search::SearchError),

    /// Session store failure
    #[error(transparent)]
    MetaData(#[from] repoinsight_meta_data::MetaDataError),
}

impl CodedError for QueryError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::SessionNotFound => ErrorCode::SessionNotFound,
            Self::SessionNotReady(_) => ErrorCode::SessionNotReady,
            Self::Embedding(e) => e.code(),
            Self::Llm(_) | Self::Search(_) | Self::MetaData(_) => ErrorCode::InternalError,
        }
    }
}
