//! Error types for scanning and chunking

use thiserror::Error;

/// Result type alias for parsing operations
pub type ParsingResult<T> = Result<T, ParsingError>;

/// Errors raised by the scanner and chunker
#[derive(Debug, Error)]
pub enum ParsingError {
    /// Filesystem access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Repository root does not exist or is not a directory
    #[error("Invalid repository root: {0}")]
    InvalidRoot(String),

    /// Tree-sitter grammar could not be loaded
    #[error("Language setup failed for {language}: {message}")]
    LanguageSetup { language: String, message: String },
}
