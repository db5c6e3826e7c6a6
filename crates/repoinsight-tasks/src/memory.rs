//! In-memory task queue for tests
//!
//! Same contract as the PostgreSQL backend (idempotent enqueue,
//! single-claim dequeue, retention reaping) over a mutex-guarded map.

use crate::error::TaskQueueResult;
use crate::traits::TaskQueue;
use crate::types::{TaskPayload, TaskRecord, TaskStatus, TaskSubmission};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// In-memory `TaskQueue` used across the workspace's tests
#[derive(Default)]
pub struct InMemoryTaskQueue {
    tasks: Mutex<HashMap<Uuid, TaskRecord>>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tasks<T>(&self, f: impl FnOnce(&mut HashMap<Uuid, TaskRecord>) -> T) -> T {
        let mut guard = match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, payload: &TaskPayload) -> TaskQueueResult<TaskSubmission> {
        let session_id = payload.session_id();
        Ok(self.with_tasks(|tasks| {
            if let Some(existing) = tasks.values().find(|t| t.session_id == session_id) {
                return TaskSubmission {
                    task_id: existing.task_id,
                    duplicate: true,
                };
            }
            let task_id = Uuid::new_v4();
            tasks.insert(
                task_id,
                TaskRecord {
                    task_id,
                    session_id,
                    payload: payload.clone(),
                    status: TaskStatus::Pending,
                    progress_current: 0,
                    progress_total: 100,
                    progress_message: None,
                    result: None,
                    error: None,
                    created_at: Utc::now(),
                    started_at: None,
                    completed_at: None,
                },
            );
            TaskSubmission {
                task_id,
                duplicate: false,
            }
        }))
    }

    async fn dequeue(&self) -> TaskQueueResult<Option<TaskRecord>> {
        Ok(self.with_tasks(|tasks| {
            let next_id = tasks
                .values()
                .filter(|t| t.status == TaskStatus::Pending)
                .min_by_key(|t| t.created_at)
                .map(|t| t.task_id)?;
            let task = tasks.get_mut(&next_id)?;
            task.status = TaskStatus::Started;
            task.started_at = Some(Utc::now());
            Some(task.clone())
        }))
    }

    async fn get_task(&self, task_id: &Uuid) -> TaskQueueResult<Option<TaskRecord>> {
        Ok(self.with_tasks(|tasks| tasks.get(task_id).cloned()))
    }

    async fn get_task_by_session(&self, session_id: &Uuid) -> TaskQueueResult<Option<TaskRecord>> {
        Ok(self.with_tasks(|tasks| {
            tasks
                .values()
                .find(|t| t.session_id == *session_id)
                .cloned()
        }))
    }

    async fn update_progress(
        &self,
        task_id: &Uuid,
        current: i32,
        total: i32,
        message: &str,
    ) -> TaskQueueResult<()> {
        self.with_tasks(|tasks| {
            if let Some(task) = tasks.get_mut(task_id) {
                if matches!(task.status, TaskStatus::Started | TaskStatus::Progress) {
                    task.status = TaskStatus::Progress;
                    task.progress_current = current;
                    task.progress_total = total;
                    task.progress_message = Some(message.to_string());
                }
            }
        });
        Ok(())
    }

    async fn complete(&self, task_id: &Uuid, result: &serde_json::Value) -> TaskQueueResult<()> {
        self.with_tasks(|tasks| {
            if let Some(task) = tasks.get_mut(task_id) {
                task.status = TaskStatus::Success;
                task.result = Some(result.clone());
                task.completed_at = Some(Utc::now());
            }
        });
        Ok(())
    }

    async fn fail(
        &self,
        task_id: &Uuid,
        error: &str,
        result: &serde_json::Value,
    ) -> TaskQueueResult<()> {
        self.with_tasks(|tasks| {
            if let Some(task) = tasks.get_mut(task_id) {
                task.status = TaskStatus::Failure;
                task.error = Some(error.to_string());
                task.result = Some(result.clone());
                task.completed_at = Some(Utc::now());
            }
        });
        Ok(())
    }

    async fn revoke(&self, task_id: &Uuid) -> TaskQueueResult<bool> {
        Ok(self.with_tasks(|tasks| match tasks.get_mut(task_id) {
            Some(task) if !task.status.is_terminal() => {
                task.status = TaskStatus::Revoked;
                task.completed_at = Some(Utc::now());
                true
            }
            _ => false,
        }))
    }

    async fn reap_expired(&self, retention: Duration) -> TaskQueueResult<u64> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::zero());
        Ok(self.with_tasks(|tasks| {
            let before = tasks.len();
            tasks.retain(|_, task| {
                !(task.status.is_terminal()
                    && task.completed_at.is_some_and(|done| done < cutoff))
            });
            (before - tasks.len()) as u64
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoinsight_query::{GenerationMode, QueryRequest};

    fn ingest_payload(session_id: Uuid) -> TaskPayload {
        TaskPayload::Ingest {
            repo_url: "https://github.com/pallets/flask".to_string(),
            session_id,
            embedding_config: serde_json::json!({"provider": "qwen"}),
            force_update: false,
        }
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_on_session_id() {
        let queue = InMemoryTaskQueue::new();
        let session_id = Uuid::new_v4();

        let first = queue.enqueue(&ingest_payload(session_id)).await.unwrap();
        let second = queue.enqueue(&ingest_payload(session_id)).await.unwrap();

        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert_eq!(first.task_id, second.task_id);

        // Only one execution ever happens
        assert!(queue.dequeue().await.unwrap().is_some());
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dequeue_claims_oldest_pending_once() {
        let queue = InMemoryTaskQueue::new();
        queue.enqueue(&ingest_payload(Uuid::new_v4())).await.unwrap();

        let claimed = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(claimed.status, TaskStatus::Started);
        assert!(claimed.started_at.is_some());
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn revoke_only_hits_non_terminal_tasks() {
        let queue = InMemoryTaskQueue::new();
        let submission = queue.enqueue(&ingest_payload(Uuid::new_v4())).await.unwrap();

        assert!(queue.revoke(&submission.task_id).await.unwrap());
        assert!(!queue.revoke(&submission.task_id).await.unwrap());

        let task = queue.get_task(&submission.task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Revoked);
    }

    #[tokio::test]
    async fn progress_updates_surface_to_pollers() {
        let queue = InMemoryTaskQueue::new();
        let session_id = Uuid::new_v4();
        let submission = queue
            .enqueue(&TaskPayload::Query {
                session_id,
                request: QueryRequest {
                    session_id: session_id.to_string(),
                    question: "q".to_string(),
                    generation_mode: GenerationMode::Plugin,
                    llm_config: None,
                },
            })
            .await
            .unwrap();
        queue.dequeue().await.unwrap();

        queue
            .update_progress(&submission.task_id, 40, 100, "halfway-ish")
            .await
            .unwrap();

        let task = queue.get_task(&submission.task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Progress);
        assert_eq!(task.progress_current, 40);
        assert_eq!(task.progress_message.as_deref(), Some("halfway-ish"));
    }

    #[tokio::test]
    async fn reaping_removes_only_expired_terminal_tasks() {
        let queue = InMemoryTaskQueue::new();
        let done = queue.enqueue(&ingest_payload(Uuid::new_v4())).await.unwrap();
        queue.dequeue().await.unwrap();
        let pending = queue.enqueue(&ingest_payload(Uuid::new_v4())).await.unwrap();

        queue
            .complete(&done.task_id, &serde_json::json!({"success": true}))
            .await
            .unwrap();

        // Retention of zero expires completed tasks immediately
        tokio::time::sleep(Duration::from_millis(5)).await;
        let removed = queue.reap_expired(Duration::from_secs(0)).await.unwrap();
        assert_eq!(removed, 1);

        assert!(queue.get_task(&done.task_id).await.unwrap().is_none());
        assert!(queue.get_task(&pending.task_id).await.unwrap().is_some());
    }
}
