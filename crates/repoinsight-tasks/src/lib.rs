//! RepoInsight task queue crate
//!
//! A durable PostgreSQL-backed job queue carrying ingest and query
//! tasks (idempotent enqueue, single-claim dequeue, progress
//! publication, revocation, result retention) plus the background
//! worker that executes them.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;
pub mod types;
pub mod worker;

pub use error::{TaskQueueError, TaskQueueResult};
pub use memory::InMemoryTaskQueue;
pub use postgres::PgTaskQueue;
pub use traits::TaskQueue;
pub use types::{TaskPayload, TaskRecord, TaskResultEnvelope, TaskStatus, TaskSubmission};
pub use worker::{Worker, WorkerHandle, WorkerOptions};
