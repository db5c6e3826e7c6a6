//! RepoInsight ingestion crate
//!
//! Repository acquisition (GitHub URL validation, deterministic
//! identifiers, shallow clones) and the end-to-end ingestion pipeline:
//! scan, chunk, embed in batches, store, with durable session progress
//! and cooperative cancellation.

pub mod error;
pub mod git;
pub mod pipeline;
pub mod progress;

pub use error::{IngestionError, IngestionResult};
pub use git::{
    clone_repository, extract_repo_info, looks_like_repository_url, repository_identifier,
    validate_github_url,
};
pub use pipeline::{
    EmbedderFactory, GitAcquirer, IngestOutcome, IngestRequest, IngestionPipeline,
    RegistryEmbedderFactory, RepositoryAcquirer,
};
pub use progress::{FnProgress, NoopProgress, ProgressReporter};
