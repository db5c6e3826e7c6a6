//! Error types for the task queue

use thiserror::Error;

/// Result type alias for queue operations
pub type TaskQueueResult<T> = Result<T, TaskQueueError>;

/// Errors raised by queue backends and the worker
#[derive(Debug, Error)]
pub enum TaskQueueError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Referenced task does not exist
    #[error("Task not found: {0}")]
    TaskNotFound(uuid::Uuid),
}
