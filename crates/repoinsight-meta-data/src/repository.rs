//! PostgreSQL-backed implementation of the session store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::MetaDataResult;
use crate::models::{
    AnalysisSession, FileRecord, QueryLogEntry, SessionCounters, SessionStatus,
};
use crate::traits::SessionStore;

const SESSION_COLUMNS: &str = "session_id, task_id, repository_url, repository_name, \
     repository_owner, repository_identifier, status, error_message, total_files, \
     processed_files, total_chunks, indexed_chunks, embedding_config, created_at, \
     started_at, completed_at";

/// Session store backed by PostgreSQL via sqlx
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Wrap an existing connection pool
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (shared with the task queue)
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    #[tracing::instrument(skip(self, embedding_config))]
    async fn create_session(
        &self,
        session_id: Uuid,
        repository_url: &str,
        embedding_config: &serde_json::Value,
    ) -> MetaDataResult<AnalysisSession> {
        let query = format!(
            "INSERT INTO analysis_sessions (session_id, repository_url, status, embedding_config) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, AnalysisSession>(&query)
            .bind(session_id)
            .bind(repository_url)
            .bind(SessionStatus::Pending)
            .bind(embedding_config)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(session_id = %session_id, "Created analysis session");
        Ok(session)
    }

    async fn get_session(&self, session_id: &Uuid) -> MetaDataResult<Option<AnalysisSession>> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM analysis_sessions WHERE session_id = $1");
        let session = sqlx::query_as::<_, AnalysisSession>(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn set_task_id(&self, session_id: &Uuid, task_id: &Uuid) -> MetaDataResult<()> {
        sqlx::query("UPDATE analysis_sessions SET task_id = $2 WHERE session_id = $1")
            .bind(session_id)
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(
        &self,
        session_id: &Uuid,
        status: SessionStatus,
        error_message: Option<&str>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> MetaDataResult<()> {
        sqlx::query(
            "UPDATE analysis_sessions SET \
                 status = $2, \
                 error_message = COALESCE($3, error_message), \
                 started_at = COALESCE($4, started_at), \
                 completed_at = COALESCE($5, completed_at) \
             WHERE session_id = $1",
        )
        .bind(session_id)
        .bind(status)
        .bind(error_message)
        .bind(started_at)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_repository_info(
        &self,
        session_id: &Uuid,
        owner: &str,
        name: &str,
        identifier: &str,
    ) -> MetaDataResult<()> {
        sqlx::query(
            "UPDATE analysis_sessions SET \
                 repository_owner = $2, repository_name = $3, repository_identifier = $4 \
             WHERE session_id = $1",
        )
        .bind(session_id)
        .bind(owner)
        .bind(name)
        .bind(identifier)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_counters(
        &self,
        session_id: &Uuid,
        counters: SessionCounters,
    ) -> MetaDataResult<()> {
        sqlx::query(
            "UPDATE analysis_sessions SET \
                 total_files = COALESCE($2, total_files), \
                 processed_files = COALESCE($3, processed_files), \
                 total_chunks = COALESCE($4, total_chunks), \
                 indexed_chunks = COALESCE($5, indexed_chunks) \
             WHERE session_id = $1",
        )
        .bind(session_id)
        .bind(counters.total_files)
        .bind(counters.processed_files)
        .bind(counters.total_chunks)
        .bind(counters.indexed_chunks)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_success_session_by_identifier(
        &self,
        identifier: &str,
    ) -> MetaDataResult<Option<AnalysisSession>> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM analysis_sessions \
             WHERE repository_identifier = $1 AND status = $2 \
             ORDER BY created_at DESC LIMIT 1"
        );
        let session = sqlx::query_as::<_, AnalysisSession>(&query)
            .bind(identifier)
            .bind(SessionStatus::Success)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn insert_file_records(&self, records: &[FileRecord]) -> MetaDataResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for record in records {
            insert_record(&mut tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn insert_file_record(&self, record: &FileRecord) -> MetaDataResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_record(&mut tx, record).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_query_log(&self, entry: &QueryLogEntry) -> MetaDataResult<()> {
        sqlx::query(
            "INSERT INTO query_logs (session_id, question, answer, retrieved_chunk_count, \
                 generation_mode, llm_config, retrieval_time_ms, generation_time_ms, total_time_ms) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&entry.session_id)
        .bind(&entry.question)
        .bind(&entry.answer)
        .bind(entry.retrieved_chunk_count)
        .bind(&entry.generation_mode)
        .bind(&entry.llm_config)
        .bind(entry.retrieval_time_ms)
        .bind(entry.generation_time_ms)
        .bind(entry.total_time_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

async fn insert_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    record: &FileRecord,
) -> MetaDataResult<()> {
    sqlx::query(
        "INSERT INTO file_metadata (session_id, file_path, file_type, file_extension, \
             file_size, line_count, chunk_count, processing_state, error_message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(record.session_id)
    .bind(&record.file_path)
    .bind(&record.file_type)
    .bind(&record.file_extension)
    .bind(record.file_size)
    .bind(record.line_count)
    .bind(record.chunk_count)
    .bind(record.processing_state)
    .bind(&record.error_message)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
