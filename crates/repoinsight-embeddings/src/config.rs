//! Embedding provider configuration
//!
//! The configuration arrives as opaque JSON on the ingest request and
//! is stored verbatim on the session; this module gives it a typed
//! shape with the defaults applied.

use crate::error::{EmbeddingError, EmbeddingResult};
use repoinsight_config::EmbeddingDefaults;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Typed embedding configuration parsed from the request JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingProviderConfig {
    /// Provider name, matched case-insensitively against the registry
    pub provider: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub deployment_name: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_delay: Option<f64>,
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Provider-specific extras; a null value is the empty map
    #[serde(default, deserialize_with = "deserialize_null_map")]
    pub extra_params: HashMap<String, serde_json::Value>,
}

fn deserialize_null_map<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<HashMap<String, serde_json::Value>> =
        serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

impl EmbeddingProviderConfig {
    /// Parse from the opaque JSON carried on the session.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::Config` when required fields are
    /// missing or malformed.
    pub fn from_json(value: &serde_json::Value) -> EmbeddingResult<Self> {
        let mut config: Self = serde_json::from_value(value.clone())
            .map_err(|e| EmbeddingError::Config(format!("invalid embedding config: {e}")))?;
        config.provider = config.provider.to_lowercase();
        if config.model_name.is_empty() {
            return Err(EmbeddingError::Config(
                "model_name must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Effective batch size, with the application default applied
    pub fn batch_size_or(&self, defaults: &EmbeddingDefaults) -> usize {
        self.batch_size.unwrap_or(defaults.batch_size).max(1)
    }

    /// Effective retry budget
    pub fn max_retries_or(&self, defaults: &EmbeddingDefaults) -> u32 {
        self.max_retries.unwrap_or(defaults.max_retries)
    }

    /// Effective base retry delay in seconds
    pub fn retry_delay_or(&self, defaults: &EmbeddingDefaults) -> f64 {
        self.retry_delay.unwrap_or(defaults.retry_delay_seconds)
    }

    /// Effective per-call timeout in seconds
    pub fn timeout_or(&self, defaults: &EmbeddingDefaults) -> u64 {
        self.timeout.unwrap_or(defaults.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = EmbeddingProviderConfig::from_json(&serde_json::json!({
            "provider": "Qwen",
            "model_name": "text-embedding-v4"
        }))
        .unwrap();
        assert_eq!(config.provider, "qwen");
        assert_eq!(config.model_name, "text-embedding-v4");
        assert!(config.extra_params.is_empty());
    }

    #[test]
    fn null_extra_params_is_empty_map() {
        let config = EmbeddingProviderConfig::from_json(&serde_json::json!({
            "provider": "openai",
            "model_name": "text-embedding-3-small",
            "extra_params": null
        }))
        .unwrap();
        assert!(config.extra_params.is_empty());
    }

    #[test]
    fn rejects_empty_model_name() {
        let result = EmbeddingProviderConfig::from_json(&serde_json::json!({
            "provider": "openai",
            "model_name": ""
        }));
        assert!(result.is_err());
    }
}
