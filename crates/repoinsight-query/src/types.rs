//! Request/response types for the query path

use repoinsight_search::RetrievedChunk;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Who synthesizes the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// The service calls an LLM and returns the answer
    Service,
    /// The caller generates; only retrieval runs
    Plugin,
}

impl GenerationMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Plugin => "plugin",
        }
    }
}

/// A question against an analyzed repository.
///
/// `session_id` accepts either a real session UUID or a GitHub
/// repository URL; the service resolves the latter to any successful
/// session for the same repository.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryRequest {
    pub session_id: String,
    pub question: String,
    #[serde(default = "default_generation_mode")]
    pub generation_mode: GenerationMode,
    #[serde(default)]
    #[schema(value_type = Option<serde_json::Value>)]
    pub llm_config: Option<serde_json::Value>,
}

const fn default_generation_mode() -> GenerationMode {
    GenerationMode::Service
}

/// The answer plus its evidence and timings (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub retrieved_context: Vec<RetrievedChunk>,
    pub generation_mode: GenerationMode,
    pub retrieval_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<i64>,
    pub total_time: i64,
}
