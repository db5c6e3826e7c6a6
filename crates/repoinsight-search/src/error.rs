//! Error types for retrieval

use thiserror::Error;

/// Result type alias for retrieval operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors raised by the hybrid retriever
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query embedding failed
    #[error(transparent)]
    Embedding(#[from] repoinsight_embeddings::EmbeddingError),

    /// Vector store failure outside the tolerated per-leg errors
    #[error(transparent)]
    VectorData(#[from] repoinsight_vector_data::VectorDataError),
}
