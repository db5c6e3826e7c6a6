//! Query service tests over in-memory stores and mock providers

use repoinsight_common::error::CodedError;
use repoinsight_config::RetrievalConfig;
use repoinsight_embeddings::{
    Embedder, EmbeddingProviderConfig, EmbeddingResult, MockEmbedder,
};
use repoinsight_ingestion::{repository_identifier, EmbedderFactory};
use repoinsight_llm::{Chatter, LlmConfig, LlmResult, MockChatter};
use repoinsight_meta_data::{mock::MockSessionStore, SessionStatus, SessionStore};
use repoinsight_query::{
    ChatterFactory, GenerationMode, QueryError, QueryRequest, QueryService,
};
use repoinsight_search::{Bm25Cache, HybridRetriever};
use repoinsight_vector_data::{MockVectorStore, NewDocument, VectorStore};
use std::sync::Arc;
use uuid::Uuid;

const REPO_URL: &str = "https://github.com/demo/routing";

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
    sessions: Arc<MockSessionStore>,
    chatter: Arc<MockChatter>,
    service: QueryService,
    identifier: String,
    session_id: Uuid,
}

async fn harness() -> Harness {
    let sessions = Arc::new(MockSessionStore::new());
    let store = Arc::new(MockVectorStore::new());
    let embedder = Arc::new(MockEmbedder::new());
    let chatter = Arc::new(MockChatter::new("the routing lives in src/routing.py"));

    let identifier = repository_identifier(REPO_URL).unwrap();
    store.create_collection(&identifier, 8).await.unwrap();

    let texts = [
        ("def register(path, handler): ROUTES[path] = handler", "src/routing.py"),
        ("def handle(request): return dispatch(request)", "src/app.py"),
        ("# Demo readme about the application", "README.md"),
    ];
    let documents: Vec<NewDocument> = texts
        .iter()
        .map(|(content, path)| {
            let mut metadata = serde_json::Map::new();
            metadata.insert(
                "file_path".to_string(),
                serde_json::Value::String((*path).to_string()),
            );
            metadata.insert("start_line".to_string(), serde_json::Value::from(1));
            NewDocument {
                content: (*content).to_string(),
                metadata,
            }
        })
        .collect();
    let embeddings = embedder
        .embed_documents(&documents.iter().map(|d| d.content.clone()).collect::<Vec<_>>())
        .await
        .unwrap();
    store
        .add_documents(&identifier, &documents, &embeddings)
        .await
        .unwrap();

    let session_id = Uuid::new_v4();
    sessions
        .create_session(
            session_id,
            REPO_URL,
            &serde_json::json!({"provider": "qwen", "model_name": "text-embedding-v4"}),
        )
        .await
        .unwrap();
    sessions
        .update_repository_info(&session_id, "demo", "routing", &identifier)
        .await
        .unwrap();
    sessions
        .update_status(
            &session_id,
            SessionStatus::Success,
            None,
            None,
            Some(chrono::Utc::now()),
        )
        .await
        .unwrap();

    let retriever = Arc::new(HybridRetriever::new(
        Arc::clone(&store) as Arc<dyn VectorStore>,
        Arc::new(Bm25Cache::new()),
        RetrievalConfig::default(),
    ));

    let service = QueryService::new(
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        retriever,
        Arc::new(SharedEmbedderFactory { embedder }),
        Arc::new(SharedChatterFactory {
            chatter: Arc::clone(&chatter),
        }),
    );

    Harness {
        sessions,
        chatter,
        service,
        identifier,
        session_id,
    }
}

fn plugin_request(session_id: &str, question: &str) -> QueryRequest {
    QueryRequest {
        session_id: session_id.to_string(),
        question: question.to_string(),
        generation_mode: GenerationMode::Plugin,
        llm_config: None,
    }
}

#[tokio::test]
async fn plugin_mode_returns_context_without_an_answer() {
    let harness = harness().await;
    let response = harness
        .service
        .query(&plugin_request(
            &harness.session_id.to_string(),
            "where is the request routing defined",
        ))
        .await
        .unwrap();

    assert!(response.answer.is_none());
    assert!(response.generation_time.is_none());
    assert!(!response.retrieved_context.is_empty());
    assert!(response.total_time >= response.retrieval_time);
    assert!(
        response
            .retrieved_context
            .iter()
            .any(|c| c.file_path.contains("routing")),
        "expected a routing file in the context"
    );
    assert_eq!(harness.chatter.call_count(), 0);

    let logs = harness.sessions.query_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].generation_mode, "plugin");
    assert!(logs[0].answer.is_none());
}

#[tokio::test]
async fn service_mode_generates_an_answer_from_the_context() {
    let harness = harness().await;
    let request = QueryRequest {
        session_id: harness.session_id.to_string(),
        question: "where is the request routing defined".to_string(),
        generation_mode: GenerationMode::Service,
        llm_config: Some(serde_json::json!({
            "provider": "openai",
            "model_name": "gpt-4o-mini"
        })),
    };

    let response = harness.service.query(&request).await.unwrap();

    assert_eq!(
        response.answer.as_deref(),
        Some("the routing lives in src/routing.py")
    );
    assert!(response.generation_time.is_some());
    assert_eq!(harness.chatter.call_count(), 1);

    // The prompt carried the retrieved evidence
    let prompts = harness.chatter.prompts();
    assert!(prompts[0].contains("Context:"));
    assert!(prompts[0].contains("Question: where is the request routing defined"));
    assert!(prompts[0].contains("file:"));

    let logs = harness.sessions.query_logs();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].answer.is_some());
}

#[tokio::test]
async fn repository_url_resolves_to_the_same_collection() {
    let harness = harness().await;

    let by_session = harness
        .service
        .query(&plugin_request(
            &harness.session_id.to_string(),
            "register handler",
        ))
        .await
        .unwrap();
    let by_url = harness
        .service
        .query(&plugin_request(REPO_URL, "register handler"))
        .await
        .unwrap();

    let ids = |response: &repoinsight_query::QueryResponse| {
        response
            .retrieved_context
            .iter()
            .map(|c| c.id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&by_session), ids(&by_url));
    assert!(
        by_url.retrieved_context[0]
            .id
            .contains(&harness.identifier),
        "chunk ids should be keyed by the repository identifier"
    );
}

#[tokio::test]
async fn unknown_session_is_session_not_found() {
    let harness = harness().await;
    let result = harness
        .service
        .query(&plugin_request(&Uuid::new_v4().to_string(), "anything"))
        .await;

    let error = result.unwrap_err();
    assert!(matches!(error, QueryError::SessionNotFound));
    assert_eq!(error.code().as_str(), "SessionNotFound");
}

#[tokio::test]
async fn unanalyzed_repository_url_is_session_not_found() {
    let harness = harness().await;
    let result = harness
        .service
        .query(&plugin_request(
            "https://github.com/someone/else",
            "anything",
        ))
        .await;
    assert!(matches!(result, Err(QueryError::SessionNotFound)));
}

#[tokio::test]
async fn incomplete_session_is_not_ready() {
    let harness = harness().await;
    let pending = Uuid::new_v4();
    harness
        .sessions
        .create_session(pending, REPO_URL, &serde_json::json!({}))
        .await
        .unwrap();

    let result = harness
        .service
        .query(&plugin_request(&pending.to_string(), "anything"))
        .await;

    let error = result.unwrap_err();
    assert!(matches!(error, QueryError::SessionNotReady(_)));
    assert_eq!(error.code().as_str(), "SessionNotReady");
}
