//! RepoInsight parsing and chunking crate
//!
//! Repository scanning (gitignore-aware, allow/deny listed), file
//! reading with encoding detection, and chunking: tree-sitter element
//! extraction with size-budget post-processing for supported code, a
//! recursive separator splitter for everything else.

pub mod chunk;
pub mod chunker;
pub mod encoding;
pub mod error;
pub mod file_types;
pub mod languages;
pub mod scanner;
pub mod splitter;

pub use chunk::{count_non_whitespace, Chunk, ChunkMetadata, FallbackReason};
pub use chunker::CodeChunker;
pub use encoding::{clean_text_content, read_file_content, FileContent};
pub use error::{ParsingError, ParsingResult};
pub use file_types::{classify, FileType};
pub use languages::{resolve_language, ElementKind, LanguageConfig, LANGUAGE_REGISTRY};
pub use scanner::{FileScanner, ScannedFile};
pub use splitter::RecursiveTextSplitter;
