//! Mock embedder for tests across the workspace

use crate::error::EmbeddingResult;
use crate::traits::Embedder;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic embedder that never talks to the network.
///
/// Vectors are derived from the text's bytes so different inputs get
/// different (but stable) embeddings; a call counter lets tests assert
/// the reuse short-circuit made zero embedding calls.
pub struct MockEmbedder {
    calls: AtomicUsize,
    dimension: usize,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            dimension: 8,
        }
    }

    pub const fn with_dimension(dimension: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            dimension,
        }
    }

    /// Number of embedding requests made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut seed = 0_u64;
        for byte in text.bytes() {
            seed = seed.wrapping_mul(31).wrapping_add(u64::from(byte));
        }
        (0..self.dimension)
            .map(|i| {
                let v = seed.wrapping_add(i as u64).wrapping_mul(2_654_435_761) % 1000;
                v as f32 / 1000.0
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector_for(text))
    }

    fn model_name(&self) -> &str {
        "mock-embedding-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vectors_are_deterministic_per_text() {
        let embedder = MockEmbedder::new();
        let a1 = embedder.embed_query("alpha").await.unwrap();
        let a2 = embedder.embed_query("alpha").await.unwrap();
        let b = embedder.embed_query("beta").await.unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_eq!(embedder.call_count(), 3);
    }
}
