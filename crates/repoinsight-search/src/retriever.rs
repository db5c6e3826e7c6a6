//! Hybrid retrieval: vector search + BM25 fused with RRF
//!
//! The two legs run independently and tolerate their own failures (a
//! failed leg contributes an empty ranking). Reciprocal Rank Fusion
//! combines them; the file-name boost is applied to raw BM25 scores
//! before ranking.

use crate::bm25::Bm25Index;
use crate::boost::{file_name_bonus, file_name_patterns};
use crate::error::SearchResult;
use crate::tokenize::tokenize;
use dashmap::DashMap;
use repoinsight_config::RetrievalConfig;
use repoinsight_embeddings::Embedder;
use repoinsight_vector_data::{StoredDocument, VectorStore};
use serde_json::{Map, Value};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// RRF constant from the fusion formula `1 / (k + rank)`
const RRF_K: f64 = 60.0;

/// Fused-result cache entries kept per process
const RESULT_CACHE_CAPACITY: usize = 100;

type ResultCache = Mutex<lru::LruCache<String, Vec<RetrievedChunk>>>;

/// A retrieved context chunk as returned to callers
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub content: String,
    pub file_path: String,
    pub start_line: Option<i64>,
    pub score: f64,
    pub metadata: Map<String, Value>,
}

/// One entry of a ranked list feeding the fusion
#[derive(Debug, Clone)]
struct RankedDoc {
    id: String,
    content: String,
    metadata: Map<String, Value>,
}

/// BM25 index plus the parallel ordered document list
struct CachedIndex {
    index: Bm25Index,
    documents: Vec<StoredDocument>,
}

/// Process-local BM25 cache keyed by repository identifier.
/// Entries are built on demand and replaced wholesale; eviction is
/// always safe.
#[derive(Default)]
pub struct Bm25Cache {
    entries: DashMap<String, Arc<CachedIndex>>,
}

impl Bm25Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop one identifier's entry, or everything when `None`
    pub fn clear(&self, identifier: Option<&str>) {
        match identifier {
            Some(id) => {
                self.entries.remove(id);
                tracing::info!(identifier = id, "Cleared BM25 cache entry");
            }
            None => {
                self.entries.clear();
                tracing::info!("Cleared all BM25 cache entries");
            }
        }
    }

    /// Number of cached indices
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn get_or_build(
        &self,
        identifier: &str,
        store: &dyn VectorStore,
    ) -> SearchResult<Option<Arc<CachedIndex>>> {
        if let Some(entry) = self.entries.get(identifier) {
            return Ok(Some(Arc::clone(entry.value())));
        }

        let documents = store.get_all_documents(identifier).await?;
        if documents.is_empty() {
            return Ok(None);
        }

        // Index text is chunk content concatenated with its file path
        // so path components and file names are searchable.
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| {
                let content = doc
                    .metadata
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or(&doc.content);
                let file_path = doc
                    .metadata
                    .get("file_path")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                tokenize(&format!("{content} {file_path}"))
            })
            .collect();

        let entry = Arc::new(CachedIndex {
            index: Bm25Index::build(&tokenized),
            documents,
        });
        tracing::info!(
            identifier,
            documents = entry.documents.len(),
            "Built BM25 index"
        );
        self.entries.insert(identifier.to_string(), Arc::clone(&entry));
        Ok(Some(entry))
    }
}

/// Hybrid retriever over a vector store and the BM25 cache
pub struct HybridRetriever {
    store: Arc<dyn VectorStore>,
    cache: Arc<Bm25Cache>,
    config: RetrievalConfig,
    // Fused results, keyed by identifier + question + k
    results: ResultCache,
}

impl HybridRetriever {
    pub fn new(store: Arc<dyn VectorStore>, cache: Arc<Bm25Cache>, config: RetrievalConfig) -> Self {
        let capacity = NonZeroUsize::new(RESULT_CACHE_CAPACITY)
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            cache,
            config,
            results: Mutex::new(lru::LruCache::new(capacity)),
        }
    }

    /// Drop all cached fused results (the cache-drop endpoint clears
    /// this alongside the BM25 indices)
    pub fn clear_results_cache(&self) {
        if let Ok(mut cache) = self.results.lock() {
            cache.clear();
        }
    }

    /// Run both legs and fuse, returning the top
    /// `final_context_top_k` chunks.
    ///
    /// # Errors
    ///
    /// Individual leg failures degrade to an empty ranking; only
    /// query-embedding setup failures propagate from inside the legs.
    #[tracing::instrument(skip(self, embedder, question), fields(identifier, question_chars = question.len()))]
    pub async fn retrieve(
        &self,
        identifier: &str,
        embedder: &dyn Embedder,
        question: &str,
    ) -> SearchResult<Vec<RetrievedChunk>> {
        let cache_key = format!(
            "{identifier}:{question}:{}",
            self.config.final_context_top_k
        );
        if let Ok(mut cache) = self.results.lock() {
            if let Some(cached) = cache.get(&cache_key) {
                tracing::debug!(identifier, "Result cache hit");
                return Ok(cached.clone());
            }
        }

        let vector_results = self.vector_search(identifier, embedder, question).await;
        let bm25_results = self.bm25_search(identifier, question).await;

        tracing::debug!(
            vector = vector_results.len(),
            bm25 = bm25_results.len(),
            "Fusing ranked lists"
        );

        let mut fused = reciprocal_rank_fusion(&vector_results, &bm25_results);
        fused.truncate(self.config.final_context_top_k);

        if let Ok(mut cache) = self.results.lock() {
            cache.put(cache_key, fused.clone());
        }
        Ok(fused)
    }

    async fn vector_search(
        &self,
        identifier: &str,
        embedder: &dyn Embedder,
        question: &str,
    ) -> Vec<RankedDoc> {
        let query_embedding = match embedder.embed_query(question).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::error!(identifier, "Query embedding failed: {e}");
                return Vec::new();
            }
        };

        match self
            .store
            .query(identifier, &query_embedding, self.config.vector_search_top_k)
            .await
        {
            Ok(mut hits) => {
                // Distance to similarity via 1/(1+d); the fusion only
                // consumes the resulting order.
                hits.sort_by(|a, b| {
                    let score_a = 1.0 / (1.0 + f64::from(a.distance));
                    let score_b = 1.0 / (1.0 + f64::from(b.distance));
                    score_b.total_cmp(&score_a)
                });
                hits.into_iter()
                    .map(|hit| RankedDoc {
                        id: hit.id,
                        content: hit.content,
                        metadata: hit.metadata,
                    })
                    .collect()
            }
            Err(e) => {
                tracing::error!(identifier, "Vector search failed: {e}");
                Vec::new()
            }
        }
    }

    async fn bm25_search(&self, identifier: &str, question: &str) -> Vec<RankedDoc> {
        let cached = match self.cache.get_or_build(identifier, self.store.as_ref()).await {
            Ok(Some(cached)) => cached,
            Ok(None) => {
                tracing::warn!(identifier, "No documents available for BM25");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(identifier, "BM25 index build failed: {e}");
                return Vec::new();
            }
        };

        let query_tokens = tokenize(question);
        let mut scores = cached.index.scores(&query_tokens);

        // File-name boost on the raw scores before ranking
        let patterns = file_name_patterns(&query_tokens);
        if !patterns.is_empty() {
            for (index, document) in cached.documents.iter().enumerate() {
                let file_path = document
                    .metadata
                    .get("file_path")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let bonus = file_name_bonus(&patterns, file_path);
                if bonus > 0.0 {
                    if let Some(score) = scores.get_mut(index) {
                        *score += bonus;
                    }
                }
            }
        }

        let mut scored: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.config.bm25_search_top_k);

        scored
            .into_iter()
            .filter_map(|(index, _score)| cached.documents.get(index))
            .map(|document| RankedDoc {
                id: document.id.clone(),
                content: document.content.clone(),
                metadata: document.metadata.clone(),
            })
            .collect()
    }
}

/// Fuse two ranked lists with Reciprocal Rank Fusion.
///
/// `rrf(d) = Σ 1/(k + rank)` over the lists containing `d` (ranks are
/// 1-based). Ties break by ascending vector rank, then BM25 rank, then
/// document id.
fn reciprocal_rank_fusion(vector: &[RankedDoc], bm25: &[RankedDoc]) -> Vec<RetrievedChunk> {
    struct Fused {
        doc: RankedDoc,
        vector_rank: Option<usize>,
        bm25_rank: Option<usize>,
        rrf: f64,
    }

    let mut by_id: Vec<Fused> = Vec::new();

    for (rank0, doc) in vector.iter().enumerate() {
        let rank = rank0 + 1;
        let contribution = 1.0 / (RRF_K + rank as f64);
        match by_id.iter_mut().find(|f| f.doc.id == doc.id) {
            Some(existing) => {
                existing.rrf += contribution;
                existing.vector_rank.get_or_insert(rank);
            }
            None => by_id.push(Fused {
                doc: doc.clone(),
                vector_rank: Some(rank),
                bm25_rank: None,
                rrf: contribution,
            }),
        }
    }

    for (rank0, doc) in bm25.iter().enumerate() {
        let rank = rank0 + 1;
        let contribution = 1.0 / (RRF_K + rank as f64);
        match by_id.iter_mut().find(|f| f.doc.id == doc.id) {
            Some(existing) => {
                existing.rrf += contribution;
                existing.bm25_rank.get_or_insert(rank);
            }
            None => by_id.push(Fused {
                doc: doc.clone(),
                vector_rank: None,
                bm25_rank: Some(rank),
                rrf: contribution,
            }),
        }
    }

    by_id.sort_by(|a, b| {
        b.rrf
            .total_cmp(&a.rrf)
            .then_with(|| {
                a.vector_rank
                    .unwrap_or(usize::MAX)
                    .cmp(&b.vector_rank.unwrap_or(usize::MAX))
            })
            .then_with(|| {
                a.bm25_rank
                    .unwrap_or(usize::MAX)
                    .cmp(&b.bm25_rank.unwrap_or(usize::MAX))
            })
            .then_with(|| a.doc.id.cmp(&b.doc.id))
    });

    by_id
        .into_iter()
        .map(|fused| {
            let file_path = fused
                .doc
                .metadata
                .get("file_path")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let start_line = fused.doc.metadata.get("start_line").and_then(Value::as_i64);
            RetrievedChunk {
                id: fused.doc.id,
                content: fused.doc.content,
                file_path,
                start_line,
                score: fused.rrf,
                metadata: fused.doc.metadata,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoinsight_embeddings::MockEmbedder;
    use repoinsight_vector_data::{MockVectorStore, NewDocument};

    fn ranked(id: &str) -> RankedDoc {
        RankedDoc {
            id: id.to_string(),
            content: format!("content of {id}"),
            metadata: Map::new(),
        }
    }

    #[test]
    fn rrf_math_matches_the_formula() {
        // vector = [A, B, C], bm25 = [B, D, A], k = 60
        let vector = vec![ranked("A"), ranked("B"), ranked("C")];
        let bm25 = vec![ranked("B"), ranked("D"), ranked("A")];

        let fused = reciprocal_rank_fusion(&vector, &bm25);
        assert_eq!(fused.len(), 4);

        let score_of = |id: &str| {
            fused
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.score)
                .unwrap_or_default()
        };

        let expected_a = 1.0 / 61.0 + 1.0 / 63.0;
        let expected_b = 1.0 / 62.0 + 1.0 / 61.0;
        assert!((score_of("A") - expected_a).abs() < 1e-12);
        assert!((score_of("B") - expected_b).abs() < 1e-12);

        // B outranks A; C and D trail in some order
        assert_eq!(fused[0].id, "B");
        assert_eq!(fused[1].id, "A");
        let tail: Vec<&str> = fused[2..].iter().map(|c| c.id.as_str()).collect();
        assert!(tail.contains(&"C"));
        assert!(tail.contains(&"D"));
    }

    #[test]
    fn equal_scores_break_by_vector_rank_then_id() {
        // Two docs appearing only in the vector list at the same rank
        // cannot exist; craft equal scores via symmetric positions.
        let vector = vec![ranked("X")];
        let bm25 = vec![ranked("Y")];
        let fused = reciprocal_rank_fusion(&vector, &bm25);
        // Same 1/61 score; X has a vector rank so it sorts first
        assert_eq!(fused[0].id, "X");
        assert_eq!(fused[1].id, "Y");
        assert!((fused[0].score - fused[1].score).abs() < 1e-12);
    }

    fn doc(content: &str, path: &str) -> NewDocument {
        let mut metadata = Map::new();
        metadata.insert("file_path".to_string(), Value::String(path.to_string()));
        metadata.insert("start_line".to_string(), Value::from(1));
        NewDocument {
            content: content.to_string(),
            metadata,
        }
    }

    #[tokio::test]
    async fn file_name_query_outranks_textual_mentions() {
        let store = Arc::new(MockVectorStore::new());
        store.create_collection("repo", 8).await.unwrap();
        let embedder = MockEmbedder::new();

        let texts = [
            (
                "def run_query(service): return service",
                "src/services/query_service.py",
            ),
            (
                "the query service handles query and service words everywhere \
                 query service query service",
                "docs/architecture.md",
            ),
            ("unrelated parser code", "src/parser.py"),
        ];
        let documents: Vec<NewDocument> =
            texts.iter().map(|(c, p)| doc(c, p)).collect();
        let embeddings = embedder
            .embed_documents(&documents.iter().map(|d| d.content.clone()).collect::<Vec<_>>())
            .await
            .unwrap();
        store
            .add_documents("repo", &documents, &embeddings)
            .await
            .unwrap();

        let retriever = HybridRetriever::new(
            Arc::clone(&store) as Arc<dyn VectorStore>,
            Arc::new(Bm25Cache::new()),
            RetrievalConfig::default(),
        );

        let results = retriever
            .retrieve("repo", &embedder, "show me query_service.py")
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert!(
            results[0].file_path.ends_with("/query_service.py"),
            "expected query_service.py first, got {}",
            results[0].file_path
        );
    }

    #[tokio::test]
    async fn cache_entries_are_reused_and_clearable() {
        let store = Arc::new(MockVectorStore::new());
        store.create_collection("repo", 8).await.unwrap();
        let embedder = MockEmbedder::new();
        let documents = vec![doc("alpha beta", "a.py")];
        let embeddings = embedder.embed_documents(&["alpha beta".to_string()]).await.unwrap();
        store.add_documents("repo", &documents, &embeddings).await.unwrap();

        let cache = Arc::new(Bm25Cache::new());
        let retriever = HybridRetriever::new(
            Arc::clone(&store) as Arc<dyn VectorStore>,
            Arc::clone(&cache),
            RetrievalConfig::default(),
        );

        retriever.retrieve("repo", &embedder, "alpha").await.unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear(Some("repo"));
        retriever.clear_results_cache();
        assert!(cache.is_empty());

        retriever.retrieve("repo", &embedder, "alpha").await.unwrap();
        assert_eq!(cache.len(), 1);
        cache.clear(None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn repeated_questions_hit_the_result_cache() {
        let store = Arc::new(MockVectorStore::new());
        store.create_collection("repo", 8).await.unwrap();
        let embedder = MockEmbedder::new();
        let documents = vec![doc("alpha beta gamma", "a.py")];
        let embeddings = embedder
            .embed_documents(&["alpha beta gamma".to_string()])
            .await
            .unwrap();
        store.add_documents("repo", &documents, &embeddings).await.unwrap();
        let calls_after_setup = embedder.call_count();

        let retriever = HybridRetriever::new(
            Arc::clone(&store) as Arc<dyn VectorStore>,
            Arc::new(Bm25Cache::new()),
            RetrievalConfig::default(),
        );

        let first = retriever.retrieve("repo", &embedder, "alpha").await.unwrap();
        let calls_after_first = embedder.call_count();
        assert!(calls_after_first > calls_after_setup);

        let second = retriever.retrieve("repo", &embedder, "alpha").await.unwrap();
        // Served from the cache: no further embedding calls
        assert_eq!(embedder.call_count(), calls_after_first);
        assert_eq!(
            first.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            second.iter().map(|c| c.id.as_str()).collect::<Vec<_>>()
        );
    }
}
