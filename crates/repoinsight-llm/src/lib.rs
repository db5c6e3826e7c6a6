//! RepoInsight LLM crate
//!
//! The query service depends only on the `Chatter` capability
//! (`complete(prompt) -> answer`); provider selection mirrors the
//! embedding registry with tagged variants over OpenAI-compatible chat
//! endpoints.

pub mod config;
pub mod error;
pub mod providers;
pub mod traits;

pub use config::LlmConfig;
pub use error::{LlmError, LlmResult};
pub use providers::build_chatter;
pub use traits::Chatter;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockChatter;
