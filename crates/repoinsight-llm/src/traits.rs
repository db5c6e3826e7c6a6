//! Trait abstraction for answer generation

use crate::error::LlmResult;
use async_trait::async_trait;

/// Capability set the query service needs from a language model
#[async_trait]
pub trait Chatter: Send + Sync {
    /// Complete a prompt, returning the answer text
    async fn complete(&self, prompt: &str) -> LlmResult<String>;

    /// Model identifier, for logs and diagnostics
    fn model_name(&self) -> &str;
}
