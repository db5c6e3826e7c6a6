//! Query service: session resolution, hybrid retrieval, optional
//! answer generation, and the query log

use crate::error::{QueryError, QueryServiceResult};
use crate::types::{GenerationMode, QueryRequest, QueryResponse};
use repoinsight_embeddings::EmbeddingProviderConfig;
use repoinsight_ingestion::{looks_like_repository_url, repository_identifier, EmbedderFactory};
use repoinsight_llm::{Chatter, LlmConfig, LlmResult};
use repoinsight_meta_data::{AnalysisSession, QueryLogEntry, SessionStatus, SessionStore};
use repoinsight_search::{HybridRetriever, RetrievedChunk};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Builds chatters from request configuration; swapped for a mock in
/// tests
pub trait ChatterFactory: Send + Sync {
    /// # Errors
    ///
    /// Propagates provider-registry failures (unknown provider,
    /// missing credentials).
    fn build(&self, config: &LlmConfig) -> LlmResult<Arc<dyn Chatter>>;
}

/// Factory backed by the provider registry
#[derive(Default, Clone, Copy)]
pub struct RegistryChatterFactory;

impl ChatterFactory for RegistryChatterFactory {
    fn build(&self, config: &LlmConfig) -> LlmResult<Arc<dyn Chatter>> {
        repoinsight_llm::build_chatter(config)
    }
}

/// Answers questions against analyzed repositories
pub struct QueryService {
    sessions: Arc<dyn SessionStore>,
    retriever: Arc<HybridRetriever>,
    embedders: Arc<dyn EmbedderFactory>,
    chatters: Arc<dyn ChatterFactory>,
}

impl QueryService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        retriever: Arc<HybridRetriever>,
        embedders: Arc<dyn EmbedderFactory>,
        chatters: Arc<dyn ChatterFactory>,
    ) -> Self {
        Self {
            sessions,
            retriever,
            embedders,
            chatters,
        }
    }

    /// Execute a query end to end.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` / `SessionNotReady` for precondition
    /// failures; embedding, retrieval, and LLM errors propagate with
    /// their codes. A query log row is written on success.
    #[tracing::instrument(skip(self, request), fields(session_id = %request.session_id))]
    pub async fn query(&self, request: &QueryRequest) -> QueryServiceResult<QueryResponse> {
        let start = Instant::now();

        let (session, identifier) = self.resolve_session(&request.session_id).await?;
        tracing::info!(
            identifier,
            mode = request.generation_mode.as_str(),
            "Query resolved to repository"
        );

        // Query embedding uses the same configuration the ingest ran with
        let embedding_config = EmbeddingProviderConfig::from_json(&session.embedding_config)?;
        let embedder = self.embedders.build(&embedding_config)?;

        let retrieval_start = Instant::now();
        let retrieved = self
            .retriever
            .retrieve(&identifier, embedder.as_ref(), &request.question)
            .await?;
        let retrieval_time = retrieval_start.elapsed().as_millis() as i64;
        tracing::info!(
            identifier,
            retrieval_ms = retrieval_time,
            results = retrieved.len(),
            "Retrieval complete"
        );

        let mut answer = None;
        let mut generation_time = None;

        if request.generation_mode == GenerationMode::Service {
            if let Some(llm_config_json) = &request.llm_config {
                let llm_config = LlmConfig::from_json(llm_config_json)?;
                let chatter = self.chatters.build(&llm_config)?;

                let generation_start = Instant::now();
                let prompt = build_prompt(&request.question, &retrieved);
                let generated = chatter.complete(&prompt).await?;
                generation_time = Some(generation_start.elapsed().as_millis() as i64);
                tracing::info!(
                    identifier,
                    generation_ms = generation_time,
                    answer_chars = generated.len(),
                    "Answer generated"
                );
                answer = Some(generated);
            }
        }

        let response = QueryResponse {
            answer,
            retrieved_context: retrieved,
            generation_mode: request.generation_mode,
            retrieval_time,
            generation_time,
            total_time: start.elapsed().as_millis() as i64,
        };

        self.log_query(request, &response).await;
        Ok(response)
    }

    /// Resolve the request's `session_id` field: an exact successful
    /// session wins; otherwise a GitHub-URL-shaped input falls back to
    /// any successful session for the same repository identifier.
    async fn resolve_session(
        &self,
        input: &str,
    ) -> QueryServiceResult<(AnalysisSession, String)> {
        if let Ok(session_id) = input.parse::<Uuid>() {
            if let Some(session) = self.sessions.get_session(&session_id).await? {
                if session.status != SessionStatus::Success {
                    return Err(QueryError::SessionNotReady(session.status.to_string()));
                }
                let identifier = match &session.repository_identifier {
                    Some(identifier) => identifier.clone(),
                    None => repository_identifier(&session.repository_url)
                        .map_err(|_| QueryError::SessionNotFound)?,
                };
                return Ok((session, identifier));
            }
        }

        if looks_like_repository_url(input) {
            let identifier =
                repository_identifier(input).map_err(|_| QueryError::SessionNotFound)?;
            if let Some(session) = self
                .sessions
                .find_success_session_by_identifier(&identifier)
                .await?
            {
                tracing::info!(identifier, "Resolved repository URL to existing session");
                return Ok((session, identifier));
            }
            return Err(QueryError::SessionNotFound);
        }

        Err(QueryError::SessionNotFound)
    }

    async fn log_query(&self, request: &QueryRequest, response: &QueryResponse) {
        let entry = QueryLogEntry {
            session_id: request.session_id.clone(),
            question: request.question.clone(),
            answer: response.answer.clone(),
            retrieved_chunk_count: response.retrieved_context.len() as i32,
            generation_mode: request.generation_mode.as_str().to_string(),
            llm_config: request.llm_config.clone(),
            retrieval_time_ms: Some(response.retrieval_time),
            generation_time_ms: response.generation_time,
            total_time_ms: Some(response.total_time),
        };
        if let Err(e) = self.sessions.insert_query_log(&entry).await {
            tracing::error!("Failed to write query log: {e}");
        }
    }
}

/// Assemble the generation prompt from the retrieved context
fn build_prompt(question: &str, retrieved: &[RetrievedChunk]) -> String {
    let mut context = String::new();
    for (index, chunk) in retrieved.iter().enumerate() {
        context.push_str(&format!("[doc {}] file: {}", index + 1, chunk.file_path));
        if let Some(line) = chunk.start_line {
            context.push_str(&format!(" (line {line})"));
        }
        context.push('\n');
        context.push_str(&chunk.content);
        context.push_str("\n\n");
    }

    format!(
        "You are a code analysis assistant. Answer the user's question from the \
         repository context below. Cite file names and line numbers where relevant, \
         explain what the code does, and say clearly when the context does not \
         contain the answer.\n\n\
         Context:\n{context}\
         Question: {question}\n\n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_context_and_question() {
        let chunks = vec![RetrievedChunk {
            id: "chunk_repo_0".to_string(),
            content: "def route(): pass".to_string(),
            file_path: "src/routing.py".to_string(),
            start_line: Some(12),
            score: 0.5,
            metadata: serde_json::Map::new(),
        }];
        let prompt = build_prompt("where is routing?", &chunks);

        assert!(prompt.contains("[doc 1] file: src/routing.py (line 12)"));
        assert!(prompt.contains("def route(): pass"));
        assert!(prompt.contains("Question: where is routing?"));
        assert!(prompt.trim_end().ends_with("Answer:"));
    }
}
