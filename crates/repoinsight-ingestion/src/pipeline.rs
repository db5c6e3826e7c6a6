//! End-to-end ingestion orchestration
//!
//! Drives clone -> scan -> chunk -> embed -> store for one session,
//! with durable progress on the session row, advisory progress to the
//! task runtime, and cooperative cancellation at the natural
//! checkpoints (between files, between embedding batches).

use crate::error::{IngestionError, IngestionResult};
use crate::git;
use crate::progress::ProgressReporter;
use async_trait::async_trait;
use chrono::Utc;
use repoinsight_config::ApplicationConfig;
use repoinsight_embeddings::{
    build_embedder, BatchEmbeddingProcessor, Embedder, EmbeddingProviderConfig, EmbeddingResult,
};
use repoinsight_meta_data::{
    FileProcessingState, FileRecord, SessionCounters, SessionStatus, SessionStore,
};
use repoinsight_parsing::{read_file_content, Chunk, CodeChunker, FileContent, FileScanner};
use repoinsight_vector_data::{NewDocument, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How many file records accumulate before a batch insert
const FILE_RECORD_BATCH_SIZE: usize = 50;

/// Request for one ingest run
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub repo_url: String,
    pub session_id: Uuid,
    pub embedding_config: serde_json::Value,
    pub force_update: bool,
}

/// Final pipeline outcome surfaced in the task result
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IngestOutcome {
    pub status: SessionStatus,
    pub repository_identifier: String,
    /// The collection already held chunks and was reused as-is
    pub reused: bool,
    pub total_files: usize,
    pub total_chunks: usize,
    pub indexed_chunks: usize,
}

/// Builds embedders from request configuration; swapped for a mock in
/// tests
pub trait EmbedderFactory: Send + Sync {
    /// # Errors
    ///
    /// Propagates provider-registry failures (unknown provider,
    /// missing credentials).
    fn build(&self, config: &EmbeddingProviderConfig) -> EmbeddingResult<Arc<dyn Embedder>>;
}

/// Factory backed by the provider registry
pub struct RegistryEmbedderFactory {
    defaults: repoinsight_config::EmbeddingDefaults,
}

impl RegistryEmbedderFactory {
    pub const fn new(defaults: repoinsight_config::EmbeddingDefaults) -> Self {
        Self { defaults }
    }
}

impl EmbedderFactory for RegistryEmbedderFactory {
    fn build(&self, config: &EmbeddingProviderConfig) -> EmbeddingResult<Arc<dyn Embedder>> {
        build_embedder(config, &self.defaults)
    }
}

/// Produces a local working copy for a repository URL; swapped for a
/// fixture directory in tests
#[async_trait]
pub trait RepositoryAcquirer: Send + Sync {
    /// # Errors
    ///
    /// Returns `IngestionError::CloneFailed` (or URL validation
    /// failures) when no working copy can be produced.
    async fn acquire(&self, repo_url: &str, force_update: bool) -> IngestionResult<PathBuf>;
}

/// Shallow-clone acquirer with the configured timeout
pub struct GitAcquirer {
    config: repoinsight_config::GitConfig,
}

impl GitAcquirer {
    pub const fn new(config: repoinsight_config::GitConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RepositoryAcquirer for GitAcquirer {
    async fn acquire(&self, repo_url: &str, force_update: bool) -> IngestionResult<PathBuf> {
        let url = repo_url.to_string();
        let config = self.config.clone();
        let timeout = Duration::from_secs(config.clone_timeout_seconds);

        let handle =
            tokio::task::spawn_blocking(move || git::clone_repository(&url, &config, force_update));

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(IngestionError::CloneFailed(format!(
                "clone task failed: {join_error}"
            ))),
            Err(_) => Err(IngestionError::CloneFailed(format!(
                "clone timed out after {}s",
                self.config.clone_timeout_seconds
            ))),
        }
    }
}

/// The ingestion orchestrator
pub struct IngestionPipeline {
    sessions: Arc<dyn SessionStore>,
    store: Arc<dyn VectorStore>,
    embedders: Arc<dyn EmbedderFactory>,
    acquirer: Arc<dyn RepositoryAcquirer>,
    config: ApplicationConfig,
}

impl IngestionPipeline {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        store: Arc<dyn VectorStore>,
        embedders: Arc<dyn EmbedderFactory>,
        acquirer: Arc<dyn RepositoryAcquirer>,
        config: ApplicationConfig,
    ) -> Self {
        Self {
            sessions,
            store,
            embedders,
            acquirer,
            config,
        }
    }

    /// Run one ingest to completion, recording the terminal state on
    /// the session.
    ///
    /// # Errors
    ///
    /// Fatal phase failures (steps 1-4) mark the session failed and
    /// propagate; cancellation marks it cancelled and returns
    /// `IngestionError::Cancelled`. Per-file and per-batch failures are
    /// recorded and end in `PartialSuccess` instead of an error.
    #[tracing::instrument(skip(self, request, progress, cancel), fields(session_id = %request.session_id, repo_url = %request.repo_url))]
    pub async fn run(
        &self,
        request: &IngestRequest,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> IngestionResult<IngestOutcome> {
        match self.execute(request, progress, cancel).await {
            Ok(outcome) => Ok(outcome),
            Err(IngestionError::Cancelled) => {
                tracing::info!("Ingest cancelled; marking session");
                self.sessions
                    .update_status(
                        &request.session_id,
                        SessionStatus::Cancelled,
                        None,
                        None,
                        Some(Utc::now()),
                    )
                    .await?;
                Err(IngestionError::Cancelled)
            }
            Err(e) => {
                tracing::error!("Ingest failed: {e}");
                self.sessions
                    .update_status(
                        &request.session_id,
                        SessionStatus::Failed,
                        Some(&e.to_string()),
                        None,
                        Some(Utc::now()),
                    )
                    .await?;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        request: &IngestRequest,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> IngestionResult<IngestOutcome> {
        let session_id = &request.session_id;

        // Phase 1: session goes processing
        self.sessions
            .update_status(
                session_id,
                SessionStatus::Processing,
                None,
                Some(Utc::now()),
                None,
            )
            .await?;
        progress.report(5, "Task initialized");

        // Phase 2: embedder from the request configuration
        let embedding_config = EmbeddingProviderConfig::from_json(&request.embedding_config)?;
        let embedder = self.embedders.build(&embedding_config)?;
        progress.report(15, "Embedding model ready");

        // Phase 3: identifier, reuse short-circuit, collection
        let identifier = git::repository_identifier(&request.repo_url)?;
        let (owner, name) = git::extract_repo_info(&request.repo_url)?;
        self.sessions
            .update_repository_info(session_id, &owner, &name, &identifier)
            .await?;

        if self.store.collection_exists(&identifier).await? {
            let existing = self.store.count(&identifier).await?;
            if existing > 0 {
                tracing::info!(
                    identifier,
                    chunks = existing,
                    "Repository already analyzed; reusing collection"
                );
                self.sessions
                    .update_status(
                        session_id,
                        SessionStatus::Success,
                        None,
                        None,
                        Some(Utc::now()),
                    )
                    .await?;
                progress.report(100, "Reused existing analysis");
                return Ok(IngestOutcome {
                    status: SessionStatus::Success,
                    repository_identifier: identifier,
                    reused: true,
                    total_files: 0,
                    total_chunks: existing,
                    indexed_chunks: existing,
                });
            }
        }

        // The credential probe doubles as dimension discovery and makes
        // auth failures fatal here rather than mid-ingest.
        let probe = embedder.embed_query("embedding dimension probe").await?;
        self.store.create_collection(&identifier, probe.len()).await?;
        progress.report(20, "Vector collection ready");

        // Phase 4: acquire the working copy
        let repo_path = self
            .acquirer
            .acquire(&request.repo_url, request.force_update)
            .await?;
        progress.report(30, "Repository cloned");

        // Phase 5: scan and chunk
        let (chunks, total_files) = self
            .scan_and_chunk(session_id, &repo_path, progress, cancel)
            .await?;
        progress.report(70, "File processing complete");

        // Phase 6: embed and store in batches
        let (indexed_chunks, failed_batches) = self
            .embed_and_store(
                session_id,
                &identifier,
                &embedder,
                &embedding_config,
                &chunks,
                progress,
                cancel,
            )
            .await?;

        // Phase 7: terminal status
        let status = if failed_batches == 0 {
            SessionStatus::Success
        } else {
            SessionStatus::PartialSuccess
        };
        let error_message = (failed_batches > 0)
            .then(|| format!("{failed_batches} embedding batches failed"));
        self.sessions
            .update_status(
                session_id,
                status,
                error_message.as_deref(),
                None,
                Some(Utc::now()),
            )
            .await?;
        progress.report(100, "Task complete");

        Ok(IngestOutcome {
            status,
            repository_identifier: identifier,
            reused: false,
            total_files,
            total_chunks: chunks.len(),
            indexed_chunks,
        })
    }

    /// Phase 5: walk the repository, chunk every readable file, and
    /// persist file records in salvageable batches.
    async fn scan_and_chunk(
        &self,
        session_id: &Uuid,
        repo_path: &std::path::Path,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> IngestionResult<(Vec<Chunk>, usize)> {
        let scanner = FileScanner::from_config(&self.config.scanner);
        let chunker = CodeChunker::new(self.config.chunking);

        let files = scanner.scan(repo_path)?;
        let total_files = files.len();
        self.sessions
            .update_counters(session_id, SessionCounters::total_files(total_files as i32))
            .await?;
        tracing::info!(total_files, "Scan found files to process");

        let mut all_chunks: Vec<Chunk> = Vec::new();
        let mut record_buffer: Vec<FileRecord> = Vec::new();
        let mut processed_files = 0_usize;

        for (index, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                self.flush_file_records(&mut record_buffer).await;
                return Err(IngestionError::Cancelled);
            }

            let percent = 35 + ((index + 1) * 35 / total_files.max(1)) as u8;
            progress.report(
                percent.min(70),
                &format!("Processing file {}/{total_files}", index + 1),
            );

            let mut record = FileRecord::pending(
                *session_id,
                &file.relative_path,
                file.file_type.as_str(),
                file.extension.clone(),
                file.size_bytes as i64,
            );

            match read_file_content(&file.absolute_path, self.config.chunking.max_file_size_bytes)
            {
                Err(e) => {
                    record.processing_state = FileProcessingState::Failed;
                    record.error_message = Some(e.to_string());
                }
                Ok(FileContent::TooLarge { size_bytes }) => {
                    record.processing_state = FileProcessingState::Skipped;
                    record.error_message =
                        Some(format!("file exceeds size limit ({size_bytes} bytes)"));
                }
                Ok(FileContent::Binary) => {
                    record.processing_state = FileProcessingState::Skipped;
                    record.error_message = Some("binary content".to_string());
                }
                Ok(FileContent::Text(content)) if content.is_empty() => {
                    record.processing_state = FileProcessingState::Skipped;
                    record.error_message = Some("empty file".to_string());
                }
                Ok(FileContent::Text(content)) => {
                    record.line_count = Some(content.lines().count() as i32);
                    let chunks = chunker.chunk_file(
                        &content,
                        &file.relative_path,
                        file.file_type,
                        file.language,
                    );
                    if chunks.is_empty() {
                        record.processing_state = FileProcessingState::Skipped;
                        record.error_message = Some("no chunks produced".to_string());
                    } else {
                        record.chunk_count = chunks.len() as i32;
                        record.processing_state = FileProcessingState::Success;
                        processed_files += 1;
                        all_chunks.extend(chunks);
                    }
                }
            }

            record_buffer.push(record);
            if record_buffer.len() >= FILE_RECORD_BATCH_SIZE {
                self.flush_file_records(&mut record_buffer).await;
                self.sessions
                    .update_counters(
                        session_id,
                        SessionCounters {
                            processed_files: Some(processed_files as i32),
                            total_chunks: Some(all_chunks.len() as i32),
                            ..SessionCounters::default()
                        },
                    )
                    .await?;
            }
        }

        self.flush_file_records(&mut record_buffer).await;
        self.sessions
            .update_counters(
                session_id,
                SessionCounters {
                    processed_files: Some(processed_files as i32),
                    total_chunks: Some(all_chunks.len() as i32),
                    ..SessionCounters::default()
                },
            )
            .await?;

        tracing::info!(
            processed_files,
            total_chunks = all_chunks.len(),
            "Chunking complete"
        );
        Ok((all_chunks, total_files))
    }

    /// Batch insert with one-at-a-time salvage on failure.
    async fn flush_file_records(&self, buffer: &mut Vec<FileRecord>) {
        if buffer.is_empty() {
            return;
        }
        let records = std::mem::take(buffer);
        if let Err(e) = self.sessions.insert_file_records(&records).await {
            tracing::error!("Batch file-record insert failed, salvaging individually: {e}");
            for record in &records {
                if let Err(individual) = self.sessions.insert_file_record(record).await {
                    tracing::error!(
                        file_path = %record.file_path,
                        "File-record insert failed: {individual}"
                    );
                }
            }
        }
    }

    /// Phase 6: fixed-size batches through the embedder into the
    /// collection; failures are counted, not fatal.
    #[allow(clippy::too_many_arguments)]
    async fn embed_and_store(
        &self,
        session_id: &Uuid,
        identifier: &str,
        embedder: &Arc<dyn Embedder>,
        embedding_config: &EmbeddingProviderConfig,
        chunks: &[Chunk],
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> IngestionResult<(usize, usize)> {
        if chunks.is_empty() {
            tracing::warn!("Repository produced no chunks to embed");
            return Ok((0, 0));
        }

        let defaults = &self.config.embedding;
        let batch_size = embedding_config.batch_size_or(defaults);
        let processor = BatchEmbeddingProcessor::new(
            Arc::clone(embedder),
            batch_size,
            embedding_config.max_retries_or(defaults),
            Duration::from_secs_f64(embedding_config.retry_delay_or(defaults)),
        );

        let total = chunks.len();
        let total_batches = total.div_ceil(batch_size);
        let mut indexed = 0_usize;
        let mut failed_batches = 0_usize;

        for (batch_number, batch) in chunks.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                return Err(IngestionError::Cancelled);
            }

            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let documents: Vec<NewDocument> = batch
                .iter()
                .map(|c| NewDocument {
                    content: c.content.clone(),
                    metadata: c.metadata_map(),
                })
                .collect();

            let stored = match processor.embed_batch_with_retry(&texts).await {
                Ok(embeddings) => {
                    self.store
                        .add_documents(identifier, &documents, &embeddings)
                        .await
                }
                Err(e) => {
                    tracing::error!(
                        batch = batch_number + 1,
                        total_batches,
                        "Embedding batch failed: {e}"
                    );
                    failed_batches += 1;
                    continue;
                }
            };

            match stored {
                Ok(_) => {
                    indexed += batch.len();
                    self.sessions
                        .update_counters(session_id, SessionCounters::indexed_chunks(indexed as i32))
                        .await?;
                    let percent = 70 + (indexed * 25 / total) as u8;
                    progress.report(
                        percent.min(95),
                        &format!("Indexed {indexed}/{total} chunks"),
                    );
                }
                Err(e) => {
                    tracing::error!(
                        batch = batch_number + 1,
                        total_batches,
                        "Vector store write failed: {e}"
                    );
                    failed_batches += 1;
                }
            }
        }

        Ok((indexed, failed_batches))
    }
}
