//! Schema creation for the metadata store
//!
//! Statements are idempotent (`IF NOT EXISTS`) so the store can run
//! them unconditionally at startup.

use crate::error::MetaDataResult;
use sqlx::PgPool;

const CREATE_ANALYSIS_SESSIONS: &str = r"
CREATE TABLE IF NOT EXISTS analysis_sessions (
    session_id UUID PRIMARY KEY,
    task_id UUID,
    repository_url TEXT NOT NULL,
    repository_name TEXT,
    repository_owner TEXT,
    repository_identifier TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    error_message TEXT,
    total_files INTEGER NOT NULL DEFAULT 0,
    processed_files INTEGER NOT NULL DEFAULT 0,
    total_chunks INTEGER NOT NULL DEFAULT 0,
    indexed_chunks INTEGER NOT NULL DEFAULT 0,
    embedding_config JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    started_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ
)";

const CREATE_SESSIONS_IDENTIFIER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_sessions_repository_identifier
    ON analysis_sessions (repository_identifier)
    WHERE repository_identifier IS NOT NULL";

const CREATE_FILE_METADATA: &str = r"
CREATE TABLE IF NOT EXISTS file_metadata (
    id BIGSERIAL PRIMARY KEY,
    session_id UUID NOT NULL,
    file_path TEXT NOT NULL,
    file_type TEXT NOT NULL,
    file_extension TEXT,
    file_size BIGINT NOT NULL,
    line_count INTEGER,
    chunk_count INTEGER NOT NULL DEFAULT 0,
    processing_state TEXT NOT NULL DEFAULT 'pending',
    error_message TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_FILE_METADATA_SESSION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_file_metadata_session
    ON file_metadata (session_id)";

const CREATE_QUERY_LOGS: &str = r"
CREATE TABLE IF NOT EXISTS query_logs (
    id BIGSERIAL PRIMARY KEY,
    session_id TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT,
    retrieved_chunk_count INTEGER NOT NULL DEFAULT 0,
    generation_mode TEXT NOT NULL DEFAULT 'service',
    llm_config JSONB,
    retrieval_time_ms BIGINT,
    generation_time_ms BIGINT,
    total_time_ms BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// Create all metadata tables if missing.
///
/// # Errors
///
/// Returns `MetaDataError::Database` when a DDL statement fails.
pub async fn run_migrations(pool: &PgPool) -> MetaDataResult<()> {
    for statement in [
        CREATE_ANALYSIS_SESSIONS,
        CREATE_SESSIONS_IDENTIFIER_INDEX,
        CREATE_FILE_METADATA,
        CREATE_FILE_METADATA_SESSION_INDEX,
        CREATE_QUERY_LOGS,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Metadata schema is up to date");
    Ok(())
}
