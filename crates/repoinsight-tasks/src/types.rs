//! Task records, payloads, statuses, and results

use chrono::{DateTime, Utc};
use repoinsight_query::QueryRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status surfaced to callers polling a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Started,
    Progress,
    Success,
    Failure,
    Revoked,
}

impl TaskStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Revoked)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Started => "started",
            Self::Progress => "progress",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two task kinds the queue carries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskPayload {
    /// Ingest a repository into its collection
    Ingest {
        repo_url: String,
        session_id: Uuid,
        embedding_config: serde_json::Value,
        #[serde(default)]
        force_update: bool,
    },
    /// Answer a question against an analyzed repository
    Query {
        session_id: Uuid,
        request: QueryRequest,
    },
}

impl TaskPayload {
    /// Kind tag stored alongside the payload
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ingest { .. } => "ingest",
            Self::Query { .. } => "query",
        }
    }

    /// The session the task is keyed by (enqueue idempotency key)
    pub const fn session_id(&self) -> Uuid {
        match self {
            Self::Ingest { session_id, .. } | Self::Query { session_id, .. } => *session_id,
        }
    }
}

/// A task as stored in the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: Uuid,
    pub session_id: Uuid,
    pub payload: TaskPayload,
    pub status: TaskStatus,
    pub progress_current: i32,
    pub progress_total: i32,
    pub progress_message: Option<String>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Outcome of an enqueue attempt
#[derive(Debug, Clone, Copy)]
pub struct TaskSubmission {
    pub task_id: Uuid,
    /// A task for this session already existed; no new execution
    pub duplicate: bool,
}

/// Uniform result envelope stored on completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub session_id: Uuid,
}

impl TaskResultEnvelope {
    pub fn success(session_id: Uuid, data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            session_id,
        }
    }

    pub fn failure(session_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Success.is_terminal());
        assert!(TaskStatus::Failure.is_terminal());
        assert!(TaskStatus::Revoked.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Progress.is_terminal());
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = TaskPayload::Ingest {
            repo_url: "https://github.com/pallets/flask".to_string(),
            session_id: Uuid::new_v4(),
            embedding_config: serde_json::json!({"provider": "qwen"}),
            force_update: false,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "ingest");
        let parsed: TaskPayload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.kind(), "ingest");
        assert_eq!(parsed.session_id(), payload.session_id());
    }
}
