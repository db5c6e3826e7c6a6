//! PostgreSQL-backed task queue
//!
//! The broker is a single `tasks` table: idempotent enqueue via a
//! unique session key, dequeue with `FOR UPDATE SKIP LOCKED` so
//! multiple workers never claim the same task, and a reaper for
//! results past their retention window.

use crate::error::TaskQueueResult;
use crate::traits::TaskQueue;
use crate::types::{TaskPayload, TaskRecord, TaskStatus, TaskSubmission};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

const TASK_COLUMNS: &str = "task_id, session_id, payload, status, progress_current, \
     progress_total, progress_message, result, error, created_at, started_at, completed_at";

const CREATE_TASKS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    task_id UUID PRIMARY KEY,
    session_id UUID NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    payload JSONB NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    progress_current INTEGER NOT NULL DEFAULT 0,
    progress_total INTEGER NOT NULL DEFAULT 100,
    progress_message TEXT,
    result JSONB,
    error TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    started_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ
)";

const CREATE_TASKS_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_tasks_status_created
    ON tasks (status, created_at)";

/// Task queue backed by PostgreSQL
#[derive(Clone)]
pub struct PgTaskQueue {
    pool: PgPool,
}

impl PgTaskQueue {
    /// Wrap a pool and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `TaskQueueError::Database` when DDL fails.
    pub async fn new(pool: PgPool) -> TaskQueueResult<Self> {
        for statement in [CREATE_TASKS_TABLE, CREATE_TASKS_STATUS_INDEX] {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

fn record_from_row(row: &PgRow) -> TaskQueueResult<TaskRecord> {
    let payload_json: serde_json::Value = row.try_get("payload")?;
    let payload: TaskPayload = serde_json::from_value(payload_json)?;
    Ok(TaskRecord {
        task_id: row.try_get("task_id")?,
        session_id: row.try_get("session_id")?,
        payload,
        status: row.try_get("status")?,
        progress_current: row.try_get("progress_current")?,
        progress_total: row.try_get("progress_total")?,
        progress_message: row.try_get("progress_message")?,
        result: row.try_get("result")?,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    #[tracing::instrument(skip(self, payload), fields(kind = payload.kind(), session_id = %payload.session_id()))]
    async fn enqueue(&self, payload: &TaskPayload) -> TaskQueueResult<TaskSubmission> {
        let task_id = Uuid::new_v4();
        let session_id = payload.session_id();
        let payload_json = serde_json::to_value(payload)?;

        let inserted = sqlx::query(
            "INSERT INTO tasks (task_id, session_id, kind, payload, status) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(task_id)
        .bind(session_id)
        .bind(payload.kind())
        .bind(&payload_json)
        .bind(TaskStatus::Pending)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            tracing::info!(task_id = %task_id, "Task enqueued");
            return Ok(TaskSubmission {
                task_id,
                duplicate: false,
            });
        }

        // The session already has a task; hand back its id
        let existing: Uuid = sqlx::query_scalar("SELECT task_id FROM tasks WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        tracing::info!(task_id = %existing, "Duplicate submission absorbed");
        Ok(TaskSubmission {
            task_id: existing,
            duplicate: true,
        })
    }

    async fn dequeue(&self) -> TaskQueueResult<Option<TaskRecord>> {
        // Qualified RETURNING: the CTE also exposes task_id
        let query = "WITH next AS ( \
                 SELECT task_id FROM tasks \
                 WHERE status = 'pending' \
                 ORDER BY created_at \
                 FOR UPDATE SKIP LOCKED \
                 LIMIT 1 \
             ) \
             UPDATE tasks SET status = 'started', started_at = now() \
             FROM next WHERE tasks.task_id = next.task_id \
             RETURNING tasks.*";

        let row = sqlx::query(query).fetch_optional(&self.pool).await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn get_task(&self, task_id: &Uuid) -> TaskQueueResult<Option<TaskRecord>> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = $1");
        let row = sqlx::query(&query)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn get_task_by_session(&self, session_id: &Uuid) -> TaskQueueResult<Option<TaskRecord>> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE session_id = $1");
        let row = sqlx::query(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn update_progress(
        &self,
        task_id: &Uuid,
        current: i32,
        total: i32,
        message: &str,
    ) -> TaskQueueResult<()> {
        sqlx::query(
            "UPDATE tasks SET status = 'progress', progress_current = $2, \
                 progress_total = $3, progress_message = $4 \
             WHERE task_id = $1 AND status IN ('started', 'progress')",
        )
        .bind(task_id)
        .bind(current)
        .bind(total)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete(&self, task_id: &Uuid, result: &serde_json::Value) -> TaskQueueResult<()> {
        sqlx::query(
            "UPDATE tasks SET status = 'success', result = $2, completed_at = now() \
             WHERE task_id = $1",
        )
        .bind(task_id)
        .bind(result)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail(
        &self,
        task_id: &Uuid,
        error: &str,
        result: &serde_json::Value,
    ) -> TaskQueueResult<()> {
        sqlx::query(
            "UPDATE tasks SET status = 'failure', error = $2, result = $3, \
                 completed_at = now() \
             WHERE task_id = $1",
        )
        .bind(task_id)
        .bind(error)
        .bind(result)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke(&self, task_id: &Uuid) -> TaskQueueResult<bool> {
        let affected = sqlx::query(
            "UPDATE tasks SET status = 'revoked', completed_at = now() \
             WHERE task_id = $1 AND status IN ('pending', 'started', 'progress')",
        )
        .bind(task_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected == 1)
    }

    async fn reap_expired(&self, retention: Duration) -> TaskQueueResult<u64> {
        let removed = sqlx::query(
            "DELETE FROM tasks \
             WHERE status IN ('success', 'failure', 'revoked') \
               AND completed_at < now() - make_interval(secs => $1)",
        )
        .bind(retention.as_secs_f64())
        .execute(&self.pool)
        .await?
        .rows_affected();
        if removed > 0 {
            tracing::debug!(removed, "Reaped expired task results");
        }
        Ok(removed)
    }
}
