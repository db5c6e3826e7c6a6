//! HTTP façade tests: the full router over in-memory backends, with
//! the worker driven manually between requests

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use repoinsight_api::{routes, AppState};
use repoinsight_config::ApplicationConfig;
use repoinsight_embeddings::{
    Embedder, EmbeddingProviderConfig, EmbeddingResult, MockEmbedder,
};
use repoinsight_ingestion::{
    EmbedderFactory, IngestionError, IngestionPipeline, RepositoryAcquirer,
};
use repoinsight_llm::{Chatter, LlmConfig, LlmResult, MockChatter};
use repoinsight_meta_data::{mock::MockSessionStore, SessionStore};
use repoinsight_query::{ChatterFactory, QueryService};
use repoinsight_search::{Bm25Cache, HybridRetriever};
use repoinsight_tasks::{InMemoryTaskQueue, TaskQueue, Worker, WorkerOptions};
use repoinsight_vector_data::{MockVectorStore, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const REPO_URL: &str = "https://github.com/demo/routing";

struct FixtureAcquirer {
    root: PathBuf,
}

#[async_trait]
impl RepositoryAcquirer for FixtureAcquirer {
    async fn acquire(
        &self,
        _repo_url: &str,
        _force_update: bool,
    ) -> Result<PathBuf, IngestionError> {
        Ok(self.root.clone())
    }
}

struct SharedEmbedderFactory {
    embedder: Arc<MockEmbedder>,
}

impl EmbedderFactory for SharedEmbedderFactory {
    fn build(&self, _config: &EmbeddingProviderConfig) -> EmbeddingResult<Arc<dyn Embedder>> {
        Ok(Arc::clone(&self.embedder) as Arc<dyn Embedder>)
    }
}

struct SharedChatterFactory {
    chatter: Arc<MockChatter>,
}

impl ChatterFactory for SharedChatterFactory {
    fn build(&self, _config: &LlmConfig) -> LlmResult<Arc<dyn Chatter>> {
        Ok(Arc::clone(&self.chatter) as Arc<dyn Chatter>)
    }
}

struct Harness {
    router: Router,
    worker: Worker,
    embedder: Arc<MockEmbedder>,
    _fixture: tempfile::TempDir,
}

fn write(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn harness() -> Harness {
    let fixture = tempfile::tempdir().unwrap();
    write(
        fixture.path(),
        "src/routing.py",
        "ROUTES = {}\n\ndef register(path, handler):\n    ROUTES[path] = handler\n",
    );
    write(
        fixture.path(),
        "src/app.py",
        "def handle(request):\n    return request.path\n",
    );

    let sessions = Arc::new(MockSessionStore::new());
    let store = Arc::new(MockVectorStore::new());
    let embedder = Arc::new(MockEmbedder::new());
    let queue = Arc::new(InMemoryTaskQueue::new());
    let bm25_cache = Arc::new(Bm25Cache::new());

    let mut config = ApplicationConfig::default();
    config.chunking.chunk_size = 120;
    config.chunking.chunk_overlap = 20;
    config.chunking.min_chunk_size = 20;
    config.chunking.max_chunk_size = 240;

    let embedder_factory = Arc::new(SharedEmbedderFactory {
        embedder: Arc::clone(&embedder),
    });

    let pipeline = Arc::new(IngestionPipeline::new(
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        Arc::clone(&store) as Arc<dyn VectorStore>,
        Arc::clone(&embedder_factory) as Arc<dyn EmbedderFactory>,
        Arc::new(FixtureAcquirer {
            root: fixture.path().to_path_buf(),
        }),
        config.clone(),
    ));

    let retriever = Arc::new(HybridRetriever::new(
        Arc::clone(&store) as Arc<dyn VectorStore>,
        Arc::clone(&bm25_cache),
        config.retrieval,
    ));
    let query_service = Arc::new(QueryService::new(
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        Arc::clone(&retriever),
        embedder_factory,
        Arc::new(SharedChatterFactory {
            chatter: Arc::new(MockChatter::new("generated answer")),
        }),
    ));

    let worker = Worker::new(
        Arc::clone(&queue) as Arc<dyn TaskQueue>,
        pipeline,
        query_service,
        WorkerOptions {
            poll_interval: Duration::from_millis(10),
            result_retention: Duration::from_secs(3600),
        },
    );

    let state = AppState::new(
        sessions,
        queue,
        worker.handle(),
        bm25_cache,
        retriever,
        store,
    );

    Harness {
        router: routes::create_router(state),
        worker,
        embedder,
        _fixture: fixture,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn delete(path: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn analyze_body() -> serde_json::Value {
    serde_json::json!({
        "repo_url": REPO_URL,
        "embedding_config": {
            "provider": "qwen",
            "model_name": "text-embedding-v4",
            "batch_size": 32
        }
    })
}

async fn analyze_and_complete(harness: &Harness) -> String {
    let (status, body) = send(&harness.router, post_json("/repos/analyze", analyze_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "queued");
    let session_id = body["session_id"].as_str().unwrap().to_string();

    assert!(harness.worker.run_once().await.unwrap());
    session_id
}

#[tokio::test]
async fn analyze_then_poll_reaches_success() {
    let harness = harness();
    let session_id = analyze_and_complete(&harness).await;

    let (status, body) = send(&harness.router, get(&format!("/repos/status/{session_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["total_files"].as_i64().unwrap() > 0);
    assert_eq!(body["indexed_chunks"], body["total_chunks"]);
    assert!(body["completed_at"].is_string());
}

#[tokio::test]
async fn reanalyzing_the_same_repository_reuses_the_collection() {
    let harness = harness();
    analyze_and_complete(&harness).await;
    let calls_after_first = harness.embedder.call_count();

    let session_id = analyze_and_complete(&harness).await;

    let (_, body) = send(&harness.router, get(&format!("/repos/status/{session_id}"))).await;
    assert_eq!(body["status"], "success");
    // The reuse short-circuit made no further embedding calls
    assert_eq!(harness.embedder.call_count(), calls_after_first);
}

#[tokio::test]
async fn invalid_repository_url_is_rejected_up_front() {
    let harness = harness();
    let (status, body) = send(
        &harness.router,
        post_json(
            "/repos/analyze",
            serde_json::json!({
                "repo_url": "https://example.com/not/github",
                "embedding_config": {"provider": "qwen", "model_name": "m"}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("GitHub"));
}

#[tokio::test]
async fn unknown_session_status_is_404() {
    let harness = harness();
    let (status, _) = send(
        &harness.router,
        get(&format!("/repos/status/{}", uuid::Uuid::new_v4())),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn query_flow_returns_context_through_the_result_endpoint() {
    let harness = harness();
    let ingest_session = analyze_and_complete(&harness).await;

    let (status, body) = send(
        &harness.router,
        post_json(
            "/repos/query",
            serde_json::json!({
                "session_id": ingest_session,
                "question": "where is the request routing defined",
                "generation_mode": "plugin"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let query_session = body["session_id"].as_str().unwrap().to_string();

    // Still processing: the result endpoint 404s
    let (status, _) = send(
        &harness.router,
        get(&format!("/repos/query/result/{query_session}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(harness.worker.run_once().await.unwrap());

    let (status, body) = send(
        &harness.router,
        get(&format!("/repos/query/status/{query_session}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = send(
        &harness.router,
        get(&format!("/repos/query/result/{query_session}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generation_mode"], "plugin");
    assert!(body["answer"].is_null());
    let context = body["retrieved_context"].as_array().unwrap();
    assert!(!context.is_empty());
    assert!(context
        .iter()
        .any(|c| c["file_path"].as_str().unwrap_or("").contains("routing")));
}

#[tokio::test]
async fn failed_query_task_surfaces_the_error_code() {
    let harness = harness();
    let (_, body) = send(
        &harness.router,
        post_json(
            "/repos/query",
            serde_json::json!({
                "session_id": uuid::Uuid::new_v4().to_string(),
                "question": "anything",
                "generation_mode": "plugin"
            }),
        ),
    )
    .await;
    let query_session = body["session_id"].as_str().unwrap().to_string();
    assert!(harness.worker.run_once().await.unwrap());

    let (status, body) = send(
        &harness.router,
        get(&format!("/repos/query/status/{query_session}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "SessionNotFound");

    let (status, _) = send(
        &harness.router,
        get(&format!("/repos/query/result/{query_session}")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelling_a_queued_analysis_marks_the_session_cancelled() {
    let harness = harness();
    let (_, body) = send(&harness.router, post_json("/repos/analyze", analyze_body())).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &harness.router,
        delete(&format!("/repos/analyze/{session_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    // The revoked task never runs
    assert!(!harness.worker.run_once().await.unwrap());

    let (_, body) = send(&harness.router, get(&format!("/repos/status/{session_id}"))).await;
    assert_eq!(body["status"], "cancelled");
}

#[tokio::test]
async fn cache_drop_reports_success() {
    let harness = harness();
    let (status, body) = send(&harness.router, delete("/cache")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn health_endpoint_reports_the_store() {
    let harness = harness();
    let (status, body) = send(&harness.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["vector_store"]["healthy"], true);
}
