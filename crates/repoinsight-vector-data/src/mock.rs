//! In-memory vector store for tests
//!
//! Implements the full `VectorStore` trait over a `DashMap`, including
//! the count-based ordinal allocation, so pipeline and retrieval tests
//! exercise the same id semantics as the Qdrant backend.

use crate::error::{VectorDataError, VectorDataResult};
use crate::traits::VectorStore;
use crate::types::{sanitize_metadata, HealthReport, NewDocument, SearchHit, StoredDocument};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Debug, Clone)]
struct StoredPoint {
    id: String,
    content: String,
    metadata: serde_json::Map<String, serde_json::Value>,
    embedding: Vec<f32>,
}

/// In-memory `VectorStore` used across the workspace's tests
#[derive(Default)]
pub struct MockVectorStore {
    collections: DashMap<String, Vec<StoredPoint>>,
}

impl MockVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0;
        }
        1.0 - dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MockVectorStore {
    async fn create_collection(&self, name: &str, _dimension: usize) -> VectorDataResult<()> {
        self.collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> VectorDataResult<bool> {
        Ok(self.collections.remove(name).is_some())
    }

    async fn collection_exists(&self, name: &str) -> VectorDataResult<bool> {
        Ok(self.collections.contains_key(name))
    }

    async fn add_documents(
        &self,
        name: &str,
        documents: &[NewDocument],
        embeddings: &[Vec<f32>],
    ) -> VectorDataResult<Vec<String>> {
        if documents.len() != embeddings.len() {
            return Err(VectorDataError::InvalidBatch(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }

        let mut collection = self
            .collections
            .get_mut(name)
            .ok_or_else(|| VectorDataError::CollectionNotFound(name.to_string()))?;

        let start_ordinal = collection.len();
        let mut ids = Vec::with_capacity(documents.len());

        for (offset, (document, embedding)) in documents.iter().zip(embeddings).enumerate() {
            let chunk_id = format!("chunk_{name}_{}", start_ordinal + offset);
            let mut metadata = sanitize_metadata(&document.metadata);
            metadata.insert(
                "content".to_string(),
                serde_json::Value::String(document.content.clone()),
            );
            collection.push(StoredPoint {
                id: chunk_id.clone(),
                content: document.content.clone(),
                metadata,
                embedding: embedding.clone(),
            });
            ids.push(chunk_id);
        }

        Ok(ids)
    }

    async fn query(
        &self,
        name: &str,
        query_vector: &[f32],
        k: usize,
    ) -> VectorDataResult<Vec<SearchHit>> {
        let collection = self
            .collections
            .get(name)
            .ok_or_else(|| VectorDataError::CollectionNotFound(name.to_string()))?;

        let mut hits: Vec<SearchHit> = collection
            .iter()
            .map(|point| SearchHit {
                id: point.id.clone(),
                content: point.content.clone(),
                metadata: point.metadata.clone(),
                distance: Self::cosine_distance(&point.embedding, query_vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn get_all_documents(&self, name: &str) -> VectorDataResult<Vec<StoredDocument>> {
        let collection = self
            .collections
            .get(name)
            .ok_or_else(|| VectorDataError::CollectionNotFound(name.to_string()))?;

        Ok(collection
            .iter()
            .map(|point| StoredDocument {
                id: point.id.clone(),
                content: point.content.clone(),
                metadata: point.metadata.clone(),
            })
            .collect())
    }

    async fn count(&self, name: &str) -> VectorDataResult<usize> {
        Ok(self.collections.get(name).map_or(0, |c| c.len()))
    }

    async fn list_collections(&self) -> VectorDataResult<Vec<String>> {
        Ok(self.collections.iter().map(|e| e.key().clone()).collect())
    }

    async fn health_check(&self) -> VectorDataResult<HealthReport> {
        Ok(HealthReport {
            healthy: true,
            collections_count: self.collections.len(),
            detail: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn doc(content: &str) -> NewDocument {
        let mut metadata = Map::new();
        metadata.insert(
            "file_path".to_string(),
            serde_json::Value::String("src/lib.rs".to_string()),
        );
        NewDocument {
            content: content.to_string(),
            metadata,
        }
    }

    #[tokio::test]
    async fn ids_continue_from_collection_count() {
        let store = MockVectorStore::new();
        store.create_collection("repo", 4).await.unwrap();

        let first = store
            .add_documents("repo", &[doc("a"), doc("b")], &[vec![1.0; 4], vec![1.0; 4]])
            .await
            .unwrap();
        let second = store
            .add_documents("repo", &[doc("c")], &[vec![1.0; 4]])
            .await
            .unwrap();

        assert_eq!(first, vec!["chunk_repo_0", "chunk_repo_1"]);
        assert_eq!(second, vec!["chunk_repo_2"]);

        // Disjoint across the two appends
        let all: std::collections::HashSet<_> =
            first.iter().chain(second.iter()).collect();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn query_orders_by_distance() {
        let store = MockVectorStore::new();
        store.create_collection("repo", 2).await.unwrap();
        store
            .add_documents(
                "repo",
                &[doc("x"), doc("y")],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .unwrap();

        let hits = store.query("repo", &[1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "chunk_repo_0");
        assert!(hits[0].distance < hits[1].distance);
    }
}
