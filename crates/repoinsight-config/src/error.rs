//! Error types for configuration loading and validation

use thiserror::Error;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was present but unparseable
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// A cross-field validation rule failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),

    /// Database connectivity problem during pool construction
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ConfigError {
    /// Invalid-value constructor used by the env readers
    pub fn invalid_value(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
