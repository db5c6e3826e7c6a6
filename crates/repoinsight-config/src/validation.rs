//! Cross-field configuration validation

use crate::error::{ConfigError, ConfigResult};
use crate::ApplicationConfig;

/// Validate rules no single field can express.
///
/// # Errors
///
/// Returns `ConfigError::Validation` describing the first violated rule.
pub fn validate(config: &ApplicationConfig) -> ConfigResult<()> {
    let chunking = &config.chunking;

    if chunking.min_chunk_size > chunking.chunk_size {
        return Err(ConfigError::Validation(format!(
            "MIN_CHUNK_SIZE ({}) must not exceed CHUNK_SIZE ({})",
            chunking.min_chunk_size, chunking.chunk_size
        )));
    }
    if chunking.chunk_size > chunking.max_chunk_size {
        return Err(ConfigError::Validation(format!(
            "CHUNK_SIZE ({}) must not exceed MAX_CHUNK_SIZE ({})",
            chunking.chunk_size, chunking.max_chunk_size
        )));
    }
    if chunking.chunk_overlap >= chunking.chunk_size {
        return Err(ConfigError::Validation(format!(
            "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
            chunking.chunk_overlap, chunking.chunk_size
        )));
    }
    if chunking.class_decompose_threshold <= 1.0 {
        return Err(ConfigError::Validation(
            "CLASS_DECOMPOSE_THRESHOLD must be greater than 1.0".to_string(),
        ));
    }

    if config.embedding.batch_size == 0 {
        return Err(ConfigError::Validation(
            "EMBEDDING_BATCH_SIZE must be at least 1".to_string(),
        ));
    }

    let retrieval = &config.retrieval;
    if retrieval.vector_search_top_k == 0
        || retrieval.bm25_search_top_k == 0
        || retrieval.final_context_top_k == 0
    {
        return Err(ConfigError::Validation(
            "retrieval top-k values must be at least 1".to_string(),
        ));
    }

    if config.scanner.allowed_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "ALLOWED_FILE_EXTENSIONS must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap_larger_than_chunk() {
        let mut config = ApplicationConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config = ApplicationConfig::default();
        config.embedding.batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_inverted_size_bounds() {
        let mut config = ApplicationConfig::default();
        config.chunking.min_chunk_size = config.chunking.max_chunk_size + 1;
        config.chunking.chunk_size = config.chunking.max_chunk_size;
        assert!(validate(&config).is_err());
    }
}
