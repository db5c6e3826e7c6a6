//! RepoInsight metadata store
//!
//! PostgreSQL persistence for analysis sessions, per-file processing
//! records, and the query log, behind a `SessionStore` trait so the
//! pipeline and query service can run against an in-memory mock in
//! tests.

pub mod error;
pub mod migrations;
pub mod mock;
pub mod models;
pub mod repository;
pub mod traits;

pub use error::{MetaDataError, MetaDataResult};
pub use migrations::run_migrations;
pub use models::{
    AnalysisSession, FileProcessingState, FileRecord, QueryLogEntry, SessionCounters,
    SessionStatus,
};
pub use repository::PgSessionStore;
pub use traits::SessionStore;
