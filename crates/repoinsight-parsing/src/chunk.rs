//! Chunk types produced by the chunker

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Why a code file fell back to a single whole-file chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    AstParsingFailed,
    UnsupportedLanguage,
}

/// Metadata carried by every chunk into the vector collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_path: String,
    pub element_type: String,
    pub element_name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub language: String,
    /// Global order within the file, assigned after post-processing
    pub chunk_index: usize,
    /// Produced by splitting an oversize element
    pub is_chunk: bool,
    /// Produced by merging small elements
    pub is_merged: bool,
    /// Original element names of a merged chunk
    pub merged_names: Option<Vec<String>>,
    pub fallback: Option<FallbackReason>,
}

impl ChunkMetadata {
    pub fn element(
        file_path: impl Into<String>,
        element_type: impl Into<String>,
        element_name: impl Into<String>,
        start_line: usize,
        end_line: usize,
        language: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            element_type: element_type.into(),
            element_name: element_name.into(),
            start_line,
            end_line,
            language: language.into(),
            chunk_index: 0,
            is_chunk: false,
            is_merged: false,
            merged_names: None,
            fallback: None,
        }
    }
}

/// An addressable fragment of source text plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Size metric used throughout post-processing
    pub fn non_whitespace_len(&self) -> usize {
        count_non_whitespace(&self.content)
    }

    /// Flatten into the scalar metadata map the vector store expects.
    /// Complex values (the merged-names list) are JSON-encoded strings.
    pub fn metadata_map(&self) -> Map<String, Value> {
        let m = &self.metadata;
        let mut map = Map::new();
        map.insert("file_path".to_string(), Value::String(m.file_path.clone()));
        map.insert(
            "element_type".to_string(),
            Value::String(m.element_type.clone()),
        );
        map.insert(
            "element_name".to_string(),
            Value::String(m.element_name.clone()),
        );
        map.insert("start_line".to_string(), Value::from(m.start_line));
        map.insert("end_line".to_string(), Value::from(m.end_line));
        map.insert("language".to_string(), Value::String(m.language.clone()));
        map.insert("chunk_index".to_string(), Value::from(m.chunk_index));
        if m.is_chunk {
            map.insert("is_chunk".to_string(), Value::Bool(true));
        }
        if m.is_merged {
            map.insert("is_merged".to_string(), Value::Bool(true));
        }
        if let Some(names) = &m.merged_names {
            map.insert(
                "merged_elements".to_string(),
                Value::String(serde_json::to_string(names).unwrap_or_default()),
            );
        }
        match m.fallback {
            Some(FallbackReason::AstParsingFailed) => {
                map.insert("ast_parsing_failed".to_string(), Value::Bool(true));
            }
            Some(FallbackReason::UnsupportedLanguage) => {
                map.insert("unsupported_language".to_string(), Value::Bool(true));
            }
            None => {}
        }
        map
    }
}

/// Non-whitespace character count, the size metric for all budgets
pub fn count_non_whitespace(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
