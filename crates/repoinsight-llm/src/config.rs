//! LLM provider configuration carried on query requests

use crate::error::{LlmError, LlmResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Typed LLM configuration parsed from the query request JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
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
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
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

impl LlmConfig {
    /// Parse from request JSON.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` when required fields are missing.
    pub fn from_json(value: &serde_json::Value) -> LlmResult<Self> {
        let mut config: Self = serde_json::from_value(value.clone())
            .map_err(|e| LlmError::Config(format!("invalid llm config: {e}")))?;
        config.provider = config.provider.to_lowercase();
        if config.model_name.is_empty() {
            return Err(LlmError::Config("model_name must not be empty".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_extra_params_is_empty_map() {
        let config = LlmConfig::from_json(&serde_json::json!({
            "provider": "OpenAI",
            "model_name": "gpt-4o-mini",
            "extra_params": null
        }))
        .unwrap();
        assert_eq!(config.provider, "openai");
        assert!(config.extra_params.is_empty());
    }
}
