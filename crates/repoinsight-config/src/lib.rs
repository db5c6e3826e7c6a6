//! Centralized configuration management for RepoInsight
//!
//! Every setting has a safe default and can be overridden via
//! environment variables. Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Environment variable overrides
//! 3. Runtime validation

pub mod error;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

// =============================================================================
// SAFE DEFAULTS - work for any environment (dev, staging, prod, test)
// =============================================================================

// API server
const DEFAULT_API_HOST: &str = "0.0.0.0";
const DEFAULT_API_PORT: u16 = 8000;

// Database (PostgreSQL)
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "repoinsight";
const DEFAULT_DB_USER: &str = "repoinsight";
const DEFAULT_DB_PASSWORD: &str = "localdev123";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 30;

// Vector storage (Qdrant)
const DEFAULT_VECTOR_DB_URL: &str = "http://localhost:6334";
const DEFAULT_VECTOR_DB_MAX_RETRIES: u32 = 3;
const DEFAULT_VECTOR_DB_RETRY_DELAY_SECONDS: u64 = 5;

// Git acquisition
const DEFAULT_GIT_CLONE_DIR: &str = "/tmp/repo_clones";
const DEFAULT_CLONE_TIMEOUT_SECONDS: u64 = 300;

// Chunking (non-whitespace character budgets)
const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CHUNK_OVERLAP: usize = 200;
const DEFAULT_MIN_CHUNK_SIZE: usize = 100;
const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;
const DEFAULT_CLASS_DECOMPOSE_THRESHOLD: f64 = 2.5;
const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024; // files above 1 MiB are skipped

// Embedding
const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 32;
const DEFAULT_EMBEDDING_MAX_RETRIES: u32 = 3;
const DEFAULT_EMBEDDING_RETRY_DELAY_SECONDS: f64 = 1.0;
const DEFAULT_EMBEDDING_TIMEOUT_SECONDS: u64 = 60;

// Retrieval
const DEFAULT_VECTOR_SEARCH_TOP_K: usize = 10;
const DEFAULT_BM25_SEARCH_TOP_K: usize = 10;
const DEFAULT_FINAL_CONTEXT_TOP_K: usize = 8;

// Task queue / worker
const DEFAULT_WORKER_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_RESULT_EXPIRES_SECONDS: u64 = 3600;

/// File extensions (and extension-less special names) processed by the
/// scanner unless overridden via `ALLOWED_FILE_EXTENSIONS`.
const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".cpp", ".cxx", ".cc", ".c", ".h", ".hpp",
    ".cs", ".php", ".rb", ".go", ".rs", ".swift", ".kt", ".scala", ".clj", ".sh", ".sql",
    ".html", ".css", ".vue", ".md", ".txt", ".rst", ".tex", ".adoc", ".json", ".yaml", ".yml",
    ".toml", ".ini", ".cfg", ".conf", ".env", ".xml", "dockerfile", "makefile", "readme",
    "license", "changelog", ".gitignore", ".gitattributes",
];

/// Directory names never descended into unless overridden via
/// `EXCLUDED_DIRECTORIES`. Dot-prefixed directories are skipped anyway.
const DEFAULT_EXCLUDED_DIRECTORIES: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    "target",
    "__pycache__",
    "venv",
    ".venv",
    "env",
    "virtualenv",
    "vendor",
    "coverage",
];

/// Core configuration for the entire RepoInsight application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// HTTP server configuration
    pub api: ApiConfig,
    /// PostgreSQL configuration
    pub database: DatabaseConfig,
    /// Vector database configuration
    pub vector_storage: VectorStorageConfig,
    /// Repository acquisition configuration
    pub git: GitConfig,
    /// Scanner allow/deny lists
    pub scanner: ScannerConfig,
    /// Chunking budgets
    pub chunking: ChunkingConfig,
    /// Embedding batch defaults
    pub embedding: EmbeddingDefaults,
    /// Hybrid retrieval knobs
    pub retrieval: RetrievalConfig,
    /// Task queue and worker knobs
    pub worker: WorkerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// PostgreSQL connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
    /// Full override; when set the individual fields are ignored
    pub url: Option<String>,
}

impl DatabaseConfig {
    /// Connection string with credentials (never log this one)
    pub fn connection_string(&self) -> String {
        self.url.clone().unwrap_or_else(|| {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            )
        })
    }

    /// Connection string with the password masked, safe for logs
    pub fn safe_connection_string(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.name
        )
    }

    /// Build a connection pool from this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Database` when the URL is malformed or the
    /// server is unreachable.
    pub async fn create_pool(&self) -> ConfigResult<PgPool> {
        let options: PgConnectOptions = self.connection_string().parse()?;
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.timeout_seconds))
            .connect_with(options)
            .await?;
        Ok(pool)
    }
}

/// Vector database (Qdrant) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStorageConfig {
    pub url: String,
    /// Connection attempts before giving up
    pub max_retries: u32,
    /// Fixed delay between connection attempts
    pub retry_delay_seconds: u64,
}

/// Repository acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Root directory for clone working copies
    pub clone_dir: String,
    /// Clone timeout in seconds
    pub clone_timeout_seconds: u64,
}

/// Scanner allow/deny lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub allowed_extensions: Vec<String>,
    pub excluded_directories: Vec<String>,
}

/// Chunking budgets, all measured in non-whitespace characters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    /// Classes larger than `chunk_size * threshold` are decomposed into
    /// a header chunk plus per-member chunks
    pub class_decompose_threshold: f64,
    /// Files larger than this many bytes are skipped entirely
    pub max_file_size_bytes: u64,
}

/// Batch/retry defaults applied when an embedding config omits them
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmbeddingDefaults {
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_delay_seconds: f64,
    pub timeout_seconds: u64,
}

/// Hybrid retrieval knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub vector_search_top_k: usize,
    pub bm25_search_top_k: usize,
    pub final_context_top_k: usize,
}

/// Task queue and worker knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub poll_interval_ms: u64,
    /// Seconds a finished task's result stays readable
    pub result_expires_seconds: u64,
}

impl ApplicationConfig {
    /// Load configuration from the environment over safe defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a variable is present
    /// but unparseable, or `ConfigError::Validation` when cross-field
    /// rules fail.
    pub fn from_env() -> ConfigResult<Self> {
        use source::{env_list, env_opt, env_parse, env_string};

        let config = Self {
            api: ApiConfig {
                host: env_string("API_HOST", DEFAULT_API_HOST),
                port: env_parse("API_PORT", DEFAULT_API_PORT)?,
            },
            database: DatabaseConfig {
                host: env_string("POSTGRES_HOST", DEFAULT_DB_HOST),
                port: env_parse("POSTGRES_PORT", DEFAULT_DB_PORT)?,
                name: env_string("POSTGRES_DB", DEFAULT_DB_NAME),
                user: env_string("POSTGRES_USER", DEFAULT_DB_USER),
                password: env_string("POSTGRES_PASSWORD", DEFAULT_DB_PASSWORD),
                max_connections: env_parse("POSTGRES_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
                timeout_seconds: env_parse("POSTGRES_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECONDS)?,
                url: env_opt("DATABASE_URL"),
            },
            vector_storage: VectorStorageConfig {
                url: env_string("QDRANT_URL", DEFAULT_VECTOR_DB_URL),
                max_retries: env_parse("VECTOR_DB_MAX_RETRIES", DEFAULT_VECTOR_DB_MAX_RETRIES)?,
                retry_delay_seconds: env_parse(
                    "VECTOR_DB_RETRY_DELAY",
                    DEFAULT_VECTOR_DB_RETRY_DELAY_SECONDS,
                )?,
            },
            git: GitConfig {
                clone_dir: env_string("GIT_CLONE_DIR", DEFAULT_GIT_CLONE_DIR),
                clone_timeout_seconds: env_parse("CLONE_TIMEOUT", DEFAULT_CLONE_TIMEOUT_SECONDS)?,
            },
            scanner: ScannerConfig {
                allowed_extensions: env_list("ALLOWED_FILE_EXTENSIONS", DEFAULT_ALLOWED_EXTENSIONS),
                excluded_directories: env_list(
                    "EXCLUDED_DIRECTORIES",
                    DEFAULT_EXCLUDED_DIRECTORIES,
                ),
            },
            chunking: ChunkingConfig {
                chunk_size: env_parse("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
                chunk_overlap: env_parse("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
                min_chunk_size: env_parse("MIN_CHUNK_SIZE", DEFAULT_MIN_CHUNK_SIZE)?,
                max_chunk_size: env_parse("MAX_CHUNK_SIZE", DEFAULT_MAX_CHUNK_SIZE)?,
                class_decompose_threshold: env_parse(
                    "CLASS_DECOMPOSE_THRESHOLD",
                    DEFAULT_CLASS_DECOMPOSE_THRESHOLD,
                )?,
                max_file_size_bytes: env_parse("MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE_BYTES)?,
            },
            embedding: EmbeddingDefaults {
                batch_size: env_parse("EMBEDDING_BATCH_SIZE", DEFAULT_EMBEDDING_BATCH_SIZE)?,
                max_retries: env_parse("EMBEDDING_MAX_RETRIES", DEFAULT_EMBEDDING_MAX_RETRIES)?,
                retry_delay_seconds: env_parse(
                    "EMBEDDING_RETRY_DELAY",
                    DEFAULT_EMBEDDING_RETRY_DELAY_SECONDS,
                )?,
                timeout_seconds: env_parse(
                    "EMBEDDING_TIMEOUT_SECONDS",
                    DEFAULT_EMBEDDING_TIMEOUT_SECONDS,
                )?,
            },
            retrieval: RetrievalConfig {
                vector_search_top_k: env_parse(
                    "VECTOR_SEARCH_TOP_K",
                    DEFAULT_VECTOR_SEARCH_TOP_K,
                )?,
                bm25_search_top_k: env_parse("BM25_SEARCH_TOP_K", DEFAULT_BM25_SEARCH_TOP_K)?,
                final_context_top_k: env_parse(
                    "FINAL_CONTEXT_TOP_K",
                    DEFAULT_FINAL_CONTEXT_TOP_K,
                )?,
            },
            worker: WorkerConfig {
                poll_interval_ms: env_parse(
                    "WORKER_POLL_INTERVAL_MS",
                    DEFAULT_WORKER_POLL_INTERVAL_MS,
                )?,
                result_expires_seconds: env_parse(
                    "RESULT_EXPIRES",
                    DEFAULT_RESULT_EXPIRES_SECONDS,
                )?,
            },
        };

        validation::validate(&config)?;
        Ok(config)
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: DEFAULT_API_HOST.to_string(),
                port: DEFAULT_API_PORT,
            },
            database: DatabaseConfig {
                host: DEFAULT_DB_HOST.to_string(),
                port: DEFAULT_DB_PORT,
                name: DEFAULT_DB_NAME.to_string(),
                user: DEFAULT_DB_USER.to_string(),
                password: DEFAULT_DB_PASSWORD.to_string(),
                max_connections: DEFAULT_DB_MAX_CONNECTIONS,
                timeout_seconds: DEFAULT_DB_TIMEOUT_SECONDS,
                url: None,
            },
            vector_storage: VectorStorageConfig {
                url: DEFAULT_VECTOR_DB_URL.to_string(),
                max_retries: DEFAULT_VECTOR_DB_MAX_RETRIES,
                retry_delay_seconds: DEFAULT_VECTOR_DB_RETRY_DELAY_SECONDS,
            },
            git: GitConfig {
                clone_dir: DEFAULT_GIT_CLONE_DIR.to_string(),
                clone_timeout_seconds: DEFAULT_CLONE_TIMEOUT_SECONDS,
            },
            scanner: ScannerConfig {
                allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
                excluded_directories: DEFAULT_EXCLUDED_DIRECTORIES
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
            },
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingDefaults::default(),
            retrieval: RetrievalConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            class_decompose_threshold: DEFAULT_CLASS_DECOMPOSE_THRESHOLD,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
        }
    }
}

impl Default for EmbeddingDefaults {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            max_retries: DEFAULT_EMBEDDING_MAX_RETRIES,
            retry_delay_seconds: DEFAULT_EMBEDDING_RETRY_DELAY_SECONDS,
            timeout_seconds: DEFAULT_EMBEDDING_TIMEOUT_SECONDS,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_search_top_k: DEFAULT_VECTOR_SEARCH_TOP_K,
            bm25_search_top_k: DEFAULT_BM25_SEARCH_TOP_K,
            final_context_top_k: DEFAULT_FINAL_CONTEXT_TOP_K,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_WORKER_POLL_INTERVAL_MS,
            result_expires_seconds: DEFAULT_RESULT_EXPIRES_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = ApplicationConfig::default();
        validation::validate(&config).unwrap();
    }

    #[test]
    fn safe_connection_string_masks_password() {
        let config = ApplicationConfig::default();
        let safe = config.database.safe_connection_string();
        assert!(safe.contains("***"));
        assert!(!safe.contains(&config.database.password));
    }

    #[test]
    fn default_scanner_lists_cover_special_names() {
        let config = ApplicationConfig::default();
        assert!(config
            .scanner
            .allowed_extensions
            .iter()
            .any(|e| e == "dockerfile"));
        assert!(config
            .scanner
            .excluded_directories
            .iter()
            .any(|d| d == "node_modules"));
    }
}
