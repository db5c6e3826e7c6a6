//! RepoInsight HTTP API
//!
//! A thin axum façade over the task queue and session store: analyze
//! requests and queries are enqueued, pollers read durable state, and
//! the background worker does the heavy lifting.

pub mod bootstrap;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

pub use bootstrap::{build, Application};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
