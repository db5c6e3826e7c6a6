//! Trait abstraction for embedding generation
//!
//! The core depends only on this capability set; provider selection is
//! a configuration concern handled by the registry.

use crate::error::EmbeddingResult;
use async_trait::async_trait;

/// Capability set every embedding backend provides
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of documents, one vector per input text
    async fn embed_documents(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Embed a single query string
    async fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Model identifier, for logs and diagnostics
    fn model_name(&self) -> &str;
}
