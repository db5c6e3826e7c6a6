//! RepoInsight query crate
//!
//! Validates the requested session (or resolves a repository URL to an
//! existing one), runs hybrid retrieval, optionally synthesizes an
//! answer through the LLM registry, and appends a query-log row.

pub mod error;
pub mod service;
pub mod types;

pub use error::{QueryError, QueryServiceResult};
pub use service::{ChatterFactory, QueryService, RegistryChatterFactory};
pub use types::{GenerationMode, QueryRequest, QueryResponse};
