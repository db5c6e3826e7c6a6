//! Domain models for database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an analysis session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Processing,
    Success,
    PartialSuccess,
    Failed,
    Cancelled,
}

impl SessionStatus {
    /// A session is terminal once no further state transitions happen
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Success | Self::PartialSuccess | Self::Failed | Self::Cancelled
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{status}")
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "partial_success" => Ok(Self::PartialSuccess),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid session status: {s}")),
        }
    }
}

/// One user-initiated ingest request and its durable state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnalysisSession {
    pub session_id: Uuid,
    pub task_id: Option<Uuid>,
    pub repository_url: String,
    pub repository_name: Option<String>,
    pub repository_owner: Option<String>,
    pub repository_identifier: Option<String>,

    pub status: SessionStatus,
    pub error_message: Option<String>,

    // Processing counters
    pub total_files: i32,
    pub processed_files: i32,
    pub total_chunks: i32,
    pub indexed_chunks: i32,

    /// Opaque embedding configuration the ingest was requested with
    pub embedding_config: serde_json::Value,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisSession {
    /// Processing duration in seconds, once both endpoints are known
    pub fn processing_duration_seconds(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }

    /// Indexing progress as a percentage of total chunks
    pub fn progress_percentage(&self) -> f64 {
        if self.total_chunks == 0 {
            return 0.0;
        }
        f64::from(self.indexed_chunks) / f64::from(self.total_chunks) * 100.0
    }
}

/// Processing outcome for a single scanned file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FileProcessingState {
    Pending,
    Success,
    Skipped,
    Failed,
}

/// One row per file the scanner encountered
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRecord {
    pub session_id: Uuid,
    pub file_path: String,
    /// code / document / config / data / binary / unknown
    pub file_type: String,
    pub file_extension: Option<String>,
    pub file_size: i64,
    pub line_count: Option<i32>,
    pub chunk_count: i32,
    pub processing_state: FileProcessingState,
    pub error_message: Option<String>,
}

impl FileRecord {
    /// Fresh pending record for a scanned file
    pub fn pending(
        session_id: Uuid,
        file_path: impl Into<String>,
        file_type: impl Into<String>,
        file_extension: Option<String>,
        file_size: i64,
    ) -> Self {
        Self {
            session_id,
            file_path: file_path.into(),
            file_type: file_type.into(),
            file_extension,
            file_size,
            line_count: None,
            chunk_count: 0,
            processing_state: FileProcessingState::Pending,
            error_message: None,
        }
    }
}

/// Append-only record of a query and its timings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub session_id: String,
    pub question: String,
    pub answer: Option<String>,
    pub retrieved_chunk_count: i32,
    /// "service" or "plugin"
    pub generation_mode: String,
    pub llm_config: Option<serde_json::Value>,
    pub retrieval_time_ms: Option<i64>,
    pub generation_time_ms: Option<i64>,
    pub total_time_ms: Option<i64>,
}

/// Partial counter update; `None` fields keep their current value
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionCounters {
    pub total_files: Option<i32>,
    pub processed_files: Option<i32>,
    pub total_chunks: Option<i32>,
    pub indexed_chunks: Option<i32>,
}

impl SessionCounters {
    pub const fn total_files(n: i32) -> Self {
        Self {
            total_files: Some(n),
            processed_files: None,
            total_chunks: None,
            indexed_chunks: None,
        }
    }

    pub const fn indexed_chunks(n: i32) -> Self {
        Self {
            total_files: None,
            processed_files: None,
            total_chunks: None,
            indexed_chunks: Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(SessionStatus::Success.is_terminal());
        assert!(SessionStatus::PartialSuccess.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::Processing.is_terminal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::Processing,
            SessionStatus::Success,
            SessionStatus::PartialSuccess,
            SessionStatus::Failed,
            SessionStatus::Cancelled,
        ] {
            let parsed: SessionStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn progress_handles_empty_sessions() {
        let session = AnalysisSession {
            session_id: Uuid::new_v4(),
            task_id: None,
            repository_url: "https://github.com/pallets/flask".to_string(),
            repository_name: None,
            repository_owner: None,
            repository_identifier: None,
            status: SessionStatus::Pending,
            error_message: None,
            total_files: 0,
            processed_files: 0,
            total_chunks: 0,
            indexed_chunks: 0,
            embedding_config: serde_json::json!({}),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        assert_eq!(session.progress_percentage(), 0.0);
        assert!(session.processing_duration_seconds().is_none());
    }
}
