//! Session store trait for dependency injection and testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MetaDataResult;
use crate::models::{
    AnalysisSession, FileRecord, QueryLogEntry, SessionCounters, SessionStatus,
};

/// Durable store for sessions, file records, and query logs
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a pending session for a new ingest request
    async fn create_session(
        &self,
        session_id: Uuid,
        repository_url: &str,
        embedding_config: &serde_json::Value,
    ) -> MetaDataResult<AnalysisSession>;

    /// Fetch a session by id
    async fn get_session(&self, session_id: &Uuid) -> MetaDataResult<Option<AnalysisSession>>;

    /// Attach the queue task id to a session
    async fn set_task_id(&self, session_id: &Uuid, task_id: &Uuid) -> MetaDataResult<()>;

    /// Transition a session's status; timestamps are set when provided
    async fn update_status(
        &self,
        session_id: &Uuid,
        status: SessionStatus,
        error_message: Option<&str>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> MetaDataResult<()>;

    /// Record resolved repository owner/name/identifier on the session
    async fn update_repository_info(
        &self,
        session_id: &Uuid,
        owner: &str,
        name: &str,
        identifier: &str,
    ) -> MetaDataResult<()>;

    /// Apply a partial counter update in a single statement
    async fn update_counters(
        &self,
        session_id: &Uuid,
        counters: SessionCounters,
    ) -> MetaDataResult<()>;

    /// Find any success session whose repository identifier matches
    async fn find_success_session_by_identifier(
        &self,
        identifier: &str,
    ) -> MetaDataResult<Option<AnalysisSession>>;

    /// Insert a batch of file records in one statement
    async fn insert_file_records(&self, records: &[FileRecord]) -> MetaDataResult<()>;

    /// Insert a single file record (salvage path for failed batches)
    async fn insert_file_record(&self, record: &FileRecord) -> MetaDataResult<()>;

    /// Append a query log row
    async fn insert_query_log(&self, entry: &QueryLogEntry) -> MetaDataResult<()>;
}
