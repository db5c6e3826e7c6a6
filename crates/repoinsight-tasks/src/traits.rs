//! Queue abstraction shared by the PostgreSQL backend and the
//! in-memory test queue

use crate::error::TaskQueueResult;
use crate::types::{TaskPayload, TaskRecord, TaskSubmission};
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// Durable task queue contract.
///
/// Enqueue is idempotent on `session_id`: submitting the same session
/// twice never spawns a second execution. Dequeue hands a pending task
/// to exactly one worker. Results stay readable until reaped after the
/// retention window.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Submit a task; returns the existing submission when the session
    /// is already queued
    async fn enqueue(&self, payload: &TaskPayload) -> TaskQueueResult<TaskSubmission>;

    /// Claim the oldest pending task, marking it started
    async fn dequeue(&self) -> TaskQueueResult<Option<TaskRecord>>;

    /// Fetch a task by id
    async fn get_task(&self, task_id: &Uuid) -> TaskQueueResult<Option<TaskRecord>>;

    /// Fetch a task by its session id
    async fn get_task_by_session(&self, session_id: &Uuid) -> TaskQueueResult<Option<TaskRecord>>;

    /// Publish progress on a running task
    async fn update_progress(
        &self,
        task_id: &Uuid,
        current: i32,
        total: i32,
        message: &str,
    ) -> TaskQueueResult<()>;

    /// Record a terminal success result
    async fn complete(&self, task_id: &Uuid, result: &serde_json::Value) -> TaskQueueResult<()>;

    /// Record a terminal failure
    async fn fail(
        &self,
        task_id: &Uuid,
        error: &str,
        result: &serde_json::Value,
    ) -> TaskQueueResult<()>;

    /// Mark a task revoked; returns false when it was already terminal
    async fn revoke(&self, task_id: &Uuid) -> TaskQueueResult<bool>;

    /// Delete terminal tasks whose results have outlived the retention
    /// window; returns how many were removed
    async fn reap_expired(&self, retention: Duration) -> TaskQueueResult<u64>;
}
