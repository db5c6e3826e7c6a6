//! In-memory session store for tests
//!
//! Mirrors the PostgreSQL implementation closely enough for pipeline
//! and query-service tests without requiring a running database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{MetaDataError, MetaDataResult};
use crate::models::{
    AnalysisSession, FileRecord, QueryLogEntry, SessionCounters, SessionStatus,
};
use crate::traits::SessionStore;

/// In-memory `SessionStore` used across the workspace's tests
#[derive(Default)]
pub struct MockSessionStore {
    sessions: DashMap<Uuid, AnalysisSession>,
    file_records: Mutex<Vec<FileRecord>>,
    query_logs: Mutex<Vec<QueryLogEntry>>,
    /// When set, batch inserts fail so the salvage path can be tested
    fail_batch_inserts: std::sync::atomic::AtomicBool,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `insert_file_records` fail; individual inserts still work
    pub fn fail_batch_inserts(&self) {
        self.fail_batch_inserts
            .store(true, std::sync::atomic::Ordering::Relaxed);
    }

    /// All file records inserted so far
    pub fn file_records(&self) -> Vec<FileRecord> {
        self.file_records.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// All query logs inserted so far
    pub fn query_logs(&self) -> Vec<QueryLogEntry> {
        self.query_logs.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn with_session<T>(
        &self,
        session_id: &Uuid,
        f: impl FnOnce(&mut AnalysisSession) -> T,
    ) -> MetaDataResult<T> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| MetaDataError::SessionNotFound(session_id.to_string()))?;
        Ok(f(entry.value_mut()))
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn create_session(
        &self,
        session_id: Uuid,
        repository_url: &str,
        embedding_config: &serde_json::Value,
    ) -> MetaDataResult<AnalysisSession> {
        let session = AnalysisSession {
            session_id,
            task_id: None,
            repository_url: repository_url.to_string(),
            repository_name: None,
            repository_owner: None,
            repository_identifier: None,
            status: SessionStatus::Pending,
            error_message: None,
            total_files: 0,
            processed_files: 0,
            total_chunks: 0,
            indexed_chunks: 0,
            embedding_config: embedding_config.clone(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.sessions.insert(session_id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: &Uuid) -> MetaDataResult<Option<AnalysisSession>> {
        Ok(self.sessions.get(session_id).map(|s| s.clone()))
    }

    async fn set_task_id(&self, session_id: &Uuid, task_id: &Uuid) -> MetaDataResult<()> {
        self.with_session(session_id, |s| s.task_id = Some(*task_id))
    }

    async fn update_status(
        &self,
        session_id: &Uuid,
        status: SessionStatus,
        error_message: Option<&str>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> MetaDataResult<()> {
        self.with_session(session_id, |s| {
            s.status = status;
            if let Some(message) = error_message {
                s.error_message = Some(message.to_string());
            }
            if started_at.is_some() {
                s.started_at = started_at;
            }
            if completed_at.is_some() {
                s.completed_at = completed_at;
            }
        })
    }

    async fn update_repository_info(
        &self,
        session_id: &Uuid,
        owner: &str,
        name: &str,
        identifier: &str,
    ) -> MetaDataResult<()> {
        self.with_session(session_id, |s| {
            s.repository_owner = Some(owner.to_string());
            s.repository_name = Some(name.to_string());
            s.repository_identifier = Some(identifier.to_string());
        })
    }

    async fn update_counters(
        &self,
        session_id: &Uuid,
        counters: SessionCounters,
    ) -> MetaDataResult<()> {
        self.with_session(session_id, |s| {
            if let Some(n) = counters.total_files {
                s.total_files = n;
            }
            if let Some(n) = counters.processed_files {
                s.processed_files = n;
            }
            if let Some(n) = counters.total_chunks {
                s.total_chunks = n;
            }
            if let Some(n) = counters.indexed_chunks {
                s.indexed_chunks = n;
            }
        })
    }

    async fn find_success_session_by_identifier(
        &self,
        identifier: &str,
    ) -> MetaDataResult<Option<AnalysisSession>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| {
                s.status == SessionStatus::Success
                    && s.repository_identifier.as_deref() == Some(identifier)
            })
            .map(|s| s.clone())
            .next())
    }

    async fn insert_file_records(&self, records: &[FileRecord]) -> MetaDataResult<()> {
        if self
            .fail_batch_inserts
            .load(std::sync::atomic::Ordering::Relaxed)
        {
            return Err(MetaDataError::InvalidData(
                "batch insert failure injected".to_string(),
            ));
        }
        if let Ok(mut guard) = self.file_records.lock() {
            guard.extend_from_slice(records);
        }
        Ok(())
    }

    async fn insert_file_record(&self, record: &FileRecord) -> MetaDataResult<()> {
        if let Ok(mut guard) = self.file_records.lock() {
            guard.push(record.clone());
        }
        Ok(())
    }

    async fn insert_query_log(&self, entry: &QueryLogEntry) -> MetaDataResult<()> {
        if let Ok(mut guard) = self.query_logs.lock() {
            guard.push(entry.clone());
        }
        Ok(())
    }
}
