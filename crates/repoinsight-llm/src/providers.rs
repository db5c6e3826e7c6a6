//! Chat provider registry
//!
//! Same shape as the embedding registry: every provider speaks the
//! OpenAI-compatible chat protocol, so selection reduces to an
//! endpoint, an auth scheme, and a default base URL.

use crate::config::LlmConfig;
use crate::error::{LlmError, LlmResult};
use crate::traits::Chatter;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

const SUPPORTED_PROVIDERS: &[&str] = &[
    "openai",
    "azure",
    "azure_openai",
    "qwen",
    "dashscope",
    "deepseek",
    "zhipu",
    "mistral",
    "ollama",
];

#[derive(Debug, Clone)]
enum Auth {
    Bearer(String),
    ApiKeyHeader(String),
    None,
}

/// Build a chatter for the given configuration.
///
/// # Errors
///
/// Returns `LlmError::UnsupportedProvider` for unknown provider names
/// and `LlmError::Config` when required settings are missing.
pub fn build_chatter(config: &LlmConfig) -> LlmResult<Arc<dyn Chatter>> {
    let provider = config.provider.as_str();
    if !SUPPORTED_PROVIDERS.contains(&provider) {
        return Err(LlmError::UnsupportedProvider(format!(
            "{provider} (supported: {})",
            SUPPORTED_PROVIDERS.join(", ")
        )));
    }

    let endpoint = resolve_endpoint(config)?;
    let auth = resolve_auth(config)?;

    let chatter = OpenAiCompatibleChatter::new(endpoint, auth, config.clone())?;
    Ok(Arc::new(chatter))
}

fn resolve_endpoint(config: &LlmConfig) -> LlmResult<String> {
    if let Some(base) = &config.api_base {
        if matches!(config.provider.as_str(), "azure" | "azure_openai") {
            let deployment = config.deployment_name.as_deref().unwrap_or(&config.model_name);
            let version = config.api_version.as_deref().unwrap_or("2024-02-01");
            return Ok(format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={version}",
                base.trim_end_matches('/')
            ));
        }
        return Ok(format!("{}/chat/completions", base.trim_end_matches('/')));
    }

    let base = match config.provider.as_str() {
        "openai" => "https://api.openai.com/v1",
        "qwen" | "dashscope" => "https://dashscope.aliyuncs.com/compatible-mode/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "zhipu" => "https://open.bigmodel.cn/api/paas/v4",
        "mistral" => "https://api.mistral.ai/v1",
        "ollama" => "http://localhost:11434/v1",
        "azure" | "azure_openai" => {
            return Err(LlmError::Config("azure provider requires api_base".to_string()));
        }
        other => return Err(LlmError::UnsupportedProvider(other.to_string())),
    };
    Ok(format!("{base}/chat/completions"))
}

fn resolve_auth(config: &LlmConfig) -> LlmResult<Auth> {
    let env_keys: &[&str] = match config.provider.as_str() {
        "openai" => &["OPENAI_API_KEY"],
        "azure" | "azure_openai" => &["AZURE_OPENAI_API_KEY"],
        "qwen" | "dashscope" => &["QWEN_API_KEY", "DASHSCOPE_API_KEY"],
        "deepseek" => &["DEEPSEEK_API_KEY"],
        "zhipu" => &["ZHIPU_API_KEY"],
        "mistral" => &["MISTRAL_API_KEY"],
        "ollama" => return Ok(Auth::None),
        _ => &[],
    };

    let key = config.api_key.clone().or_else(|| {
        env_keys
            .iter()
            .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
    });

    match key {
        Some(key) if matches!(config.provider.as_str(), "azure" | "azure_openai") => {
            Ok(Auth::ApiKeyHeader(key))
        }
        Some(key) => Ok(Auth::Bearer(key)),
        None => Err(LlmError::Config(format!(
            "no API key for provider '{}' (set it in the request or via {})",
            config.provider,
            env_keys.join("/")
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// HTTP chatter for OpenAI-compatible chat endpoints
pub struct OpenAiCompatibleChatter {
    client: reqwest::Client,
    endpoint: String,
    auth: Auth,
    config: LlmConfig,
}

impl OpenAiCompatibleChatter {
    fn new(endpoint: String, auth: Auth, config: LlmConfig) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            auth,
            config,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_endpoint(endpoint: String, config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            auth: Auth::None,
            config,
        }
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model_name,
            "messages": [{"role": "user", "content": prompt}],
        });
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        for (key, value) in &self.config.extra_params {
            body[key] = value.clone();
        }
        body
    }
}

#[async_trait::async_trait]
impl Chatter for OpenAiCompatibleChatter {
    #[tracing::instrument(skip(self, prompt), fields(model = %self.config.model_name, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let mut request = self.client.post(&self.endpoint).json(&self.request_body(prompt));
        request = match &self.auth {
            Auth::Bearer(key) => request.bearer_auth(key),
            Auth::ApiKeyHeader(key) => request.header("api-key", key),
            Auth::None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Request(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}
