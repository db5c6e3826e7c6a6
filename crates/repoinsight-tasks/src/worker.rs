//! Background worker: polls the queue and executes tasks
//!
//! One task runs at a time per worker; multiple workers share the
//! broker safely through the queue's single-claim dequeue. Cancellation
//! is cooperative: revoking a running task trips its
//! `CancellationToken`, which the pipeline observes at its checkpoints.

use crate::error::TaskQueueResult;
use crate::traits::TaskQueue;
use crate::types::{TaskPayload, TaskRecord, TaskResultEnvelope};
use dashmap::DashMap;
use repoinsight_common::error::CodedError;
use repoinsight_ingestion::{
    FnProgress, IngestRequest, IngestionError, IngestionPipeline,
};
use repoinsight_query::QueryService;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

type CancellationRegistry = Arc<DashMap<Uuid, CancellationToken>>;

/// Worker pacing and retention knobs
#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    pub poll_interval: Duration,
    pub result_retention: Duration,
}

impl WorkerOptions {
    pub const fn from_config(config: &repoinsight_config::WorkerConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            result_retention: Duration::from_secs(config.result_expires_seconds),
        }
    }
}

/// Shared handle for revoking tasks from outside the worker (the HTTP
/// cancel endpoint)
#[derive(Clone)]
pub struct WorkerHandle {
    queue: Arc<dyn TaskQueue>,
    cancellations: CancellationRegistry,
}

impl WorkerHandle {
    /// Revoke a task: pending tasks never start; running tasks observe
    /// the cancellation at their next checkpoint.
    ///
    /// # Errors
    ///
    /// Propagates queue backend failures.
    pub async fn revoke(&self, task_id: &Uuid) -> TaskQueueResult<bool> {
        let revoked = self.queue.revoke(task_id).await?;
        if let Some(token) = self.cancellations.get(task_id) {
            token.cancel();
        }
        Ok(revoked)
    }
}

/// The task executor
pub struct Worker {
    queue: Arc<dyn TaskQueue>,
    pipeline: Arc<IngestionPipeline>,
    query_service: Arc<QueryService>,
    cancellations: CancellationRegistry,
    options: WorkerOptions,
}

impl Worker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        pipeline: Arc<IngestionPipeline>,
        query_service: Arc<QueryService>,
        options: WorkerOptions,
    ) -> Self {
        Self {
            queue,
            pipeline,
            query_service,
            cancellations: Arc::new(DashMap::new()),
            options,
        }
    }

    /// Handle for external cancellation
    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            queue: Arc::clone(&self.queue),
            cancellations: Arc::clone(&self.cancellations),
        }
    }

    /// Poll loop; returns when `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            poll_ms = self.options.poll_interval.as_millis() as u64,
            "Background worker started"
        );

        loop {
            if shutdown.is_cancelled() {
                tracing::info!("Worker shutting down");
                return;
            }

            if let Err(e) = self.queue.reap_expired(self.options.result_retention).await {
                tracing::warn!("Result reaping failed: {e}");
            }

            match self.run_once().await {
                Ok(true) => {} // Immediately look for the next task
                Ok(false) => {
                    tokio::select! {
                        () = shutdown.cancelled() => return,
                        () = tokio::time::sleep(self.options.poll_interval) => {}
                    }
                }
                Err(e) => {
                    tracing::error!("Worker iteration failed: {e}");
                    tokio::time::sleep(self.options.poll_interval).await;
                }
            }
        }
    }

    /// Claim and execute at most one task; returns whether one ran.
    ///
    /// # Errors
    ///
    /// Propagates queue backend failures; task execution failures are
    /// recorded on the task instead.
    pub async fn run_once(&self) -> TaskQueueResult<bool> {
        let Some(task) = self.queue.dequeue().await? else {
            return Ok(false);
        };

        let token = CancellationToken::new();
        self.cancellations.insert(task.task_id, token.clone());

        tracing::info!(
            task_id = %task.task_id,
            session_id = %task.session_id,
            kind = task.payload.kind(),
            "Executing task"
        );
        let outcome = self.execute(&task, &token).await;
        self.cancellations.remove(&task.task_id);
        outcome?;
        Ok(true)
    }

    async fn execute(&self, task: &TaskRecord, token: &CancellationToken) -> TaskQueueResult<()> {
        match &task.payload {
            TaskPayload::Ingest {
                repo_url,
                session_id,
                embedding_config,
                force_update,
            } => {
                self.execute_ingest(
                    task.task_id,
                    IngestRequest {
                        repo_url: repo_url.clone(),
                        session_id: *session_id,
                        embedding_config: embedding_config.clone(),
                        force_update: *force_update,
                    },
                    token,
                )
                .await
            }
            TaskPayload::Query {
                session_id,
                request,
            } => self.execute_query(task.task_id, *session_id, request).await,
        }
    }

    async fn execute_ingest(
        &self,
        task_id: Uuid,
        request: IngestRequest,
        token: &CancellationToken,
    ) -> TaskQueueResult<()> {
        let session_id = request.session_id;
        let queue = Arc::clone(&self.queue);
        let reporter = FnProgress(move |percent: u8, message: &str| {
            let queue = Arc::clone(&queue);
            let message = message.to_string();
            // Advisory; fire and forget
            tokio::spawn(async move {
                if let Err(e) = queue
                    .update_progress(&task_id, i32::from(percent), 100, &message)
                    .await
                {
                    tracing::debug!("Progress update dropped: {e}");
                }
            });
        });

        match self.pipeline.run(&request, &reporter, token).await {
            Ok(outcome) => {
                let envelope = TaskResultEnvelope::success(
                    session_id,
                    serde_json::to_value(&outcome)?,
                );
                self.queue
                    .complete(&task_id, &serde_json::to_value(&envelope)?)
                    .await
            }
            Err(IngestionError::Cancelled) => {
                // The status flip to revoked already happened (or
                // happens here for safety); no result to store.
                let _ = self.queue.revoke(&task_id).await?;
                Ok(())
            }
            Err(e) => {
                let code = e.code().as_str();
                tracing::error!(task_id = %task_id, code, "Ingest task failed: {e}");
                let envelope = TaskResultEnvelope::failure(session_id, code);
                self.queue
                    .fail(&task_id, code, &serde_json::to_value(&envelope)?)
                    .await
            }
        }
    }

    async fn execute_query(
        &self,
        task_id: Uuid,
        session_id: Uuid,
        request: &repoinsight_query::QueryRequest,
    ) -> TaskQueueResult<()> {
        match self.query_service.query(request).await {
            Ok(response) => {
                let envelope = TaskResultEnvelope::success(
                    session_id,
                    serde_json::to_value(&response)?,
                );
                self.queue
                    .complete(&task_id, &serde_json::to_value(&envelope)?)
                    .await
            }
            Err(e) => {
                let code = e.code().as_str();
                tracing::warn!(task_id = %task_id, code, "Query task failed: {e}");
                let envelope = TaskResultEnvelope::failure(session_id, code);
                self.queue
                    .fail(&task_id, code, &serde_json::to_value(&envelope)?)
                    .await
            }
        }
    }
}
