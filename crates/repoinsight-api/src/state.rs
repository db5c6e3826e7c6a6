//! Application state shared by all handlers
//!
//! Initialized once at startup; handlers get cheap clones via Axum's
//! state extraction.

use repoinsight_meta_data::SessionStore;
use repoinsight_search::{Bm25Cache, HybridRetriever};
use repoinsight_tasks::{TaskQueue, WorkerHandle};
use repoinsight_vector_data::VectorStore;
use std::sync::Arc;

/// Shared services for the HTTP layer
#[derive(Clone)]
pub struct AppState {
    /// Session, file-record, and query-log store
    pub sessions: Arc<dyn SessionStore>,
    /// Durable task queue
    pub queue: Arc<dyn TaskQueue>,
    /// Cancellation handle into the background worker
    pub worker: WorkerHandle,
    /// Process-local BM25 cache (for the cache-drop endpoint)
    pub bm25_cache: Arc<Bm25Cache>,
    /// Retriever (its fused-result cache is dropped with the BM25 one)
    pub retriever: Arc<HybridRetriever>,
    /// Vector store (health checks)
    pub vector_store: Arc<dyn VectorStore>,
}

impl AppState {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        queue: Arc<dyn TaskQueue>,
        worker: WorkerHandle,
        bm25_cache: Arc<Bm25Cache>,
        retriever: Arc<HybridRetriever>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            sessions,
            queue,
            worker,
            bm25_cache,
            retriever,
            vector_store,
        }
    }
}
