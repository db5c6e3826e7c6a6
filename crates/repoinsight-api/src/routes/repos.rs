//! Repository analysis and query endpoints
//!
//! Thin handlers: validate, enqueue a task, and let pollers read state
//! from the session store or the task queue.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use repoinsight_ingestion::validate_github_url;
use repoinsight_meta_data::AnalysisSession;
use repoinsight_query::QueryRequest;
use repoinsight_tasks::{TaskPayload, TaskStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Start analyzing a repository
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// GitHub repository URL
    pub repo_url: String,
    /// Opaque embedding configuration passed through to the provider
    /// registry (provider, model_name, api_key, batch_size, ...)
    #[schema(value_type = Object)]
    pub embedding_config: serde_json::Value,
    /// Re-clone even when a valid working copy exists
    #[serde(default)]
    pub force_update: bool,
}

/// Acknowledgement that a task was queued
#[derive(Debug, Serialize, ToSchema)]
pub struct QueuedResponse {
    pub session_id: Uuid,
    pub task_id: Uuid,
    pub status: String,
    pub message: String,
}

/// Session state projection returned by the status endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub status: String,
    pub repository_url: String,
    pub repository_name: Option<String>,
    pub repository_owner: Option<String>,
    pub repository_identifier: Option<String>,
    pub total_files: i32,
    pub processed_files: i32,
    pub total_chunks: i32,
    pub indexed_chunks: i32,
    pub progress_percentage: f64,
    pub created_at: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
}

impl From<AnalysisSession> for SessionStatusResponse {
    fn from(session: AnalysisSession) -> Self {
        Self {
            session_id: session.session_id,
            status: session.status.to_string(),
            progress_percentage: session.progress_percentage(),
            repository_url: session.repository_url,
            repository_name: session.repository_name,
            repository_owner: session.repository_owner,
            repository_identifier: session.repository_identifier,
            total_files: session.total_files,
            processed_files: session.processed_files,
            total_chunks: session.total_chunks,
            indexed_chunks: session.indexed_chunks,
            created_at: Some(session.created_at.to_rfc3339()),
            started_at: session.started_at.map(|t| t.to_rfc3339()),
            completed_at: session.completed_at.map(|t| t.to_rfc3339()),
            error_message: session.error_message,
        }
    }
}

/// Cancellation acknowledgement
#[derive(Debug, Serialize, ToSchema)]
pub struct CancelResponse {
    pub session_id: Uuid,
    pub status: String,
}

/// Routes under `/repos`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/repos/analyze", post(analyze))
        .route("/repos/analyze/{session_id}", delete(cancel_analysis))
        .route("/repos/status/{session_id}", get(session_status))
        .route("/repos/query", post(query))
        .route("/repos/query/status/{session_id}", get(query_status))
        .route("/repos/query/result/{session_id}", get(query_result))
}

/// Queue a repository for analysis
#[utoipa::path(
    post,
    path = "/repos/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis queued", body = QueuedResponse),
        (status = 400, description = "Invalid repository URL"),
    )
)]
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<QueuedResponse>> {
    if !validate_github_url(&request.repo_url) {
        return Err(ApiError::BadRequest(format!(
            "not a valid GitHub repository URL: {}",
            request.repo_url
        )));
    }

    let session_id = Uuid::new_v4();
    state
        .sessions
        .create_session(session_id, &request.repo_url, &request.embedding_config)
        .await?;

    let submission = state
        .queue
        .enqueue(&TaskPayload::Ingest {
            repo_url: request.repo_url.clone(),
            session_id,
            embedding_config: request.embedding_config,
            force_update: request.force_update,
        })
        .await?;
    state.sessions.set_task_id(&session_id, &submission.task_id).await?;

    tracing::info!(
        session_id = %session_id,
        task_id = %submission.task_id,
        repo_url = %request.repo_url,
        "Analysis queued"
    );
    Ok(Json(QueuedResponse {
        session_id,
        task_id: submission.task_id,
        status: "queued".to_string(),
        message: "Repository analysis has been queued for processing".to_string(),
    }))
}

/// Read a session's durable state
#[utoipa::path(
    get,
    path = "/repos/status/{session_id}",
    params(("session_id" = Uuid, Path, description = "Analysis session id")),
    responses(
        (status = 200, description = "Session state", body = SessionStatusResponse),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionStatusResponse>> {
    let session = state
        .sessions
        .get_session(&session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("session {session_id} not found")))?;
    Ok(Json(session.into()))
}

/// Cancel an in-flight analysis
#[utoipa::path(
    delete,
    path = "/repos/analyze/{session_id}",
    params(("session_id" = Uuid, Path, description = "Analysis session id")),
    responses(
        (status = 200, description = "Cancellation outcome", body = CancelResponse),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn cancel_analysis(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<CancelResponse>> {
    let session = state
        .sessions
        .get_session(&session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("session {session_id} not found")))?;

    // Already finished: report the terminal status untouched
    if session.status.is_terminal() {
        return Ok(Json(CancelResponse {
            session_id,
            status: session.status.to_string(),
        }));
    }

    if let Some(task_id) = session.task_id {
        state
            .worker
            .revoke(&task_id)
            .await
            .map_err(ApiError::from)?;
    }

    // A pending task never reaches the pipeline, so the session is
    // finalized here; a running pipeline does the same at its next
    // checkpoint.
    state
        .sessions
        .update_status(
            &session_id,
            repoinsight_meta_data::SessionStatus::Cancelled,
            None,
            None,
            Some(chrono::Utc::now()),
        )
        .await?;

    tracing::info!(session_id = %session_id, "Analysis cancelled");
    Ok(Json(CancelResponse {
        session_id,
        status: "cancelled".to_string(),
    }))
}

/// Queue a question against an analyzed repository
#[utoipa::path(
    post,
    path = "/repos/query",
    responses(
        (status = 200, description = "Query queued", body = QueuedResponse),
    )
)]
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<Json<QueuedResponse>> {
    let session_id = Uuid::new_v4();
    let submission = state
        .queue
        .enqueue(&TaskPayload::Query {
            session_id,
            request,
        })
        .await?;

    tracing::info!(
        session_id = %session_id,
        task_id = %submission.task_id,
        "Query queued"
    );
    Ok(Json(QueuedResponse {
        session_id,
        task_id: submission.task_id,
        status: "queued".to_string(),
        message: "Query task has been queued for processing".to_string(),
    }))
}

/// Poll a query task's status
#[utoipa::path(
    get,
    path = "/repos/query/status/{session_id}",
    params(("session_id" = Uuid, Path, description = "Query task session id")),
    responses(
        (status = 200, description = "Task status metadata"),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn query_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = state
        .queue
        .get_task_by_session(&session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("task for session {session_id} not found")))?;

    let body = match task.status {
        TaskStatus::Success => serde_json::json!({
            "session_id": session_id,
            "status": "completed",
            "result": task.result,
            "message": "Task completed successfully",
        }),
        TaskStatus::Failure => serde_json::json!({
            "session_id": session_id,
            "status": "failed",
            "error": task.error,
            "message": "Task failed to complete",
        }),
        TaskStatus::Revoked => serde_json::json!({
            "session_id": session_id,
            "status": "revoked",
            "message": "Task was cancelled",
        }),
        TaskStatus::Pending | TaskStatus::Started | TaskStatus::Progress => serde_json::json!({
            "session_id": session_id,
            "status": task.status.as_str(),
            "progress": {
                "current": task.progress_current,
                "total": task.progress_total,
                "status_msg": task.progress_message,
            },
            "message": "Task is still being processed",
        }),
    };
    Ok(Json(body))
}

/// Fetch the final payload of a completed query task
#[utoipa::path(
    get,
    path = "/repos/query/result/{session_id}",
    params(("session_id" = Uuid, Path, description = "Query task session id")),
    responses(
        (status = 200, description = "Final query payload"),
        (status = 400, description = "Task failed"),
        (status = 404, description = "Task not found or still processing"),
    )
)]
pub async fn query_result(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = state
        .queue
        .get_task_by_session(&session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("task for session {session_id} not found")))?;

    match task.status {
        TaskStatus::Success => {
            let data = task
                .result
                .and_then(|mut envelope| envelope.get_mut("data").map(serde_json::Value::take))
                .ok_or_else(|| ApiError::Internal("task result is missing".to_string()))?;
            Ok(Json(data))
        }
        TaskStatus::Failure => Err(ApiError::BadRequest(format!(
            "Task failed: {}",
            task.error.unwrap_or_else(|| "Unknown error".to_string())
        ))),
        TaskStatus::Revoked => Err(ApiError::BadRequest("Task was cancelled".to_string())),
        TaskStatus::Pending | TaskStatus::Started | TaskStatus::Progress => Err(
            ApiError::NotFound("Task not found or still processing".to_string()),
        ),
    }
}
