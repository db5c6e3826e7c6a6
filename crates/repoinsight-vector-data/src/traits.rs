//! Storage abstraction for collection-keyed vector databases

use crate::error::VectorDataResult;
use crate::types::{HealthReport, NewDocument, SearchHit, StoredDocument};
use async_trait::async_trait;

/// Trait for vector storage backends, keyed by collection name.
///
/// Collections are named by repository identifier and own their chunk
/// sets. Implementations must make `create_collection` idempotent so
/// two concurrent ingests for the same identifier cannot both create
/// it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection if it does not already exist
    async fn create_collection(&self, name: &str, dimension: usize) -> VectorDataResult<()>;

    /// Drop a collection; returns false when it did not exist
    async fn delete_collection(&self, name: &str) -> VectorDataResult<bool>;

    /// Whether the collection exists
    async fn collection_exists(&self, name: &str) -> VectorDataResult<bool>;

    /// Append documents with their embeddings.
    ///
    /// Ids are allocated `chunk_{name}_{ordinal}` starting from the
    /// current collection count, so repeated ingests never reuse ids.
    /// Returns the allocated ids in input order.
    async fn add_documents(
        &self,
        name: &str,
        documents: &[NewDocument],
        embeddings: &[Vec<f32>],
    ) -> VectorDataResult<Vec<String>>;

    /// Nearest-neighbour search returning up to `k` hits
    async fn query(
        &self,
        name: &str,
        query_vector: &[f32],
        k: usize,
    ) -> VectorDataResult<Vec<SearchHit>>;

    /// Dump every document in the collection (BM25 index construction)
    async fn get_all_documents(&self, name: &str) -> VectorDataResult<Vec<StoredDocument>>;

    /// Number of documents currently stored
    async fn count(&self, name: &str) -> VectorDataResult<usize>;

    /// Names of all collections
    async fn list_collections(&self) -> VectorDataResult<Vec<String>>;

    /// Backend reachability and collection statistics
    async fn health_check(&self) -> VectorDataResult<HealthReport>;
}
