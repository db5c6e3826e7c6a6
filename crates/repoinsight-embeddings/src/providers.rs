//! Embedding provider registry
//!
//! Every supported provider speaks the OpenAI-compatible embeddings
//! protocol (`POST .../embeddings` with `{model, input}`), so provider
//! selection reduces to an endpoint, an auth scheme, and a default base
//! URL. Tagged variants in a single registry, no per-provider
//! inheritance trees.

use crate::config::EmbeddingProviderConfig;
use crate::error::{classify_failure, EmbeddingError, EmbeddingResult, FailureKind};
use crate::traits::Embedder;
use repoinsight_config::EmbeddingDefaults;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Authentication scheme applied to provider requests
#[derive(Debug, Clone)]
enum Auth {
    Bearer(String),
    /// Azure-style `api-key` header
    ApiKeyHeader(String),
    None,
}

/// Providers the registry knows how to construct
const SUPPORTED_PROVIDERS: &[&str] = &[
    "openai",
    "azure",
    "azure_openai",
    "qwen",
    "dashscope",
    "deepseek",
    "zhipu",
    "mistral",
    "jina",
    "ollama",
];

/// Build an embedder for the given configuration.
///
/// # Errors
///
/// Returns `EmbeddingError::UnsupportedProvider` for unknown provider
/// names and `EmbeddingError::Config` when required settings (API key,
/// Azure endpoint) are missing.
pub fn build_embedder(
    config: &EmbeddingProviderConfig,
    defaults: &EmbeddingDefaults,
) -> EmbeddingResult<Arc<dyn Embedder>> {
    let provider = config.provider.as_str();
    if !SUPPORTED_PROVIDERS.contains(&provider) {
        return Err(EmbeddingError::UnsupportedProvider(format!(
            "{provider} (supported: {})",
            SUPPORTED_PROVIDERS.join(", ")
        )));
    }

    let endpoint = resolve_endpoint(config)?;
    let auth = resolve_auth(config)?;
    let timeout = Duration::from_secs(config.timeout_or(defaults));

    let embedder = OpenAiCompatibleEmbedder::new(
        endpoint,
        auth,
        config.model_name.clone(),
        timeout,
    )?;
    Ok(Arc::new(embedder))
}

fn resolve_endpoint(config: &EmbeddingProviderConfig) -> EmbeddingResult<String> {
    if let Some(base) = &config.api_base {
        if matches!(config.provider.as_str(), "azure" | "azure_openai") {
            let deployment = config.deployment_name.as_deref().unwrap_or(&config.model_name);
            let version = config.api_version.as_deref().unwrap_or("2024-02-01");
            return Ok(format!(
                "{}/openai/deployments/{deployment}/embeddings?api-version={version}",
                base.trim_end_matches('/')
            ));
        }
        return Ok(format!("{}/embeddings", base.trim_end_matches('/')));
    }

    let base = match config.provider.as_str() {
        "openai" => "https://api.openai.com/v1",
        "qwen" | "dashscope" => "https://dashscope.aliyuncs.com/compatible-mode/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "zhipu" => "https://open.bigmodel.cn/api/paas/v4",
        "mistral" => "https://api.mistral.ai/v1",
        "jina" => "https://api.jina.ai/v1",
        "ollama" => "http://localhost:11434/v1",
        "azure" | "azure_openai" => {
            return Err(EmbeddingError::Config(
                "azure provider requires api_base".to_string(),
            ));
        }
        other => {
            return Err(EmbeddingError::UnsupportedProvider(other.to_string()));
        }
    };
    Ok(format!("{base}/embeddings"))
}

fn resolve_auth(config: &EmbeddingProviderConfig) -> EmbeddingResult<Auth> {
    let env_keys: &[&str] = match config.provider.as_str() {
        "openai" => &["OPENAI_API_KEY"],
        "azure" | "azure_openai" => &["AZURE_OPENAI_API_KEY"],
        "qwen" | "dashscope" => &["QWEN_API_KEY", "DASHSCOPE_API_KEY"],
        "deepseek" => &["DEEPSEEK_API_KEY"],
        "zhipu" => &["ZHIPU_API_KEY"],
        "mistral" => &["MISTRAL_API_KEY"],
        "jina" => &["JINA_API_KEY"],
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
        None => Err(EmbeddingError::Config(format!(
            "no API key for provider '{}' (set it in the request or via {})",
            config.provider,
            env_keys.join("/")
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// HTTP embedder for OpenAI-compatible endpoints
pub struct OpenAiCompatibleEmbedder {
    client: reqwest::Client,
    endpoint: String,
    auth: Auth,
    model_name: String,
}

impl OpenAiCompatibleEmbedder {
    fn new(
        endpoint: String,
        auth: Auth,
        model_name: String,
        timeout: Duration,
    ) -> EmbeddingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            auth,
            model_name,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_endpoint(endpoint: String, model_name: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            auth: Auth::None,
            model_name,
        }
    }

    async fn request(&self, inputs: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "model": self.model_name, "input": inputs }));

        request = match &self.auth {
            Auth::Bearer(key) => request.bearer_auth(key),
            Auth::ApiKeyHeader(key) => request.header("api-key", key),
            Auth::None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| map_failure(&format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_failure(&format!("HTTP {status}: {body}")));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Fatal(format!("invalid embeddings response: {e}")))?;

        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

fn map_failure(message: &str) -> EmbeddingError {
    match classify_failure(message) {
        FailureKind::RateLimit => EmbeddingError::RateLimited(message.to_string()),
        FailureKind::AuthError => EmbeddingError::Auth(message.to_string()),
        FailureKind::Transient => EmbeddingError::Transient(message.to_string()),
        FailureKind::Fatal => EmbeddingError::Fatal(message.to_string()),
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiCompatibleEmbedder {
    #[tracing::instrument(skip(self, texts), fields(model = %self.model_name, batch = texts.len()))]
    async fn embed_documents(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.request(texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                requested: texts.len(),
                received: vectors.len(),
            });
        }
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let vectors = self.request(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Fatal("provider returned no embedding".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embeds_documents_in_request_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [2.0, 2.0]},
                    {"index": 0, "embedding": [1.0, 1.0]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiCompatibleEmbedder::for_endpoint(
            format!("{}/embeddings", server.uri()),
            "test-model".to_string(),
        );
        let vectors = embedder
            .embed_documents(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 1.0], vec![2.0, 2.0]]);
    }

    #[tokio::test]
    async fn count_mismatch_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [1.0]}]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiCompatibleEmbedder::for_endpoint(
            format!("{}/embeddings", server.uri()),
            "test-model".to_string(),
        );
        let result = embedder
            .embed_documents(&["a".to_string(), "b".to_string()])
            .await;
        assert!(matches!(
            result,
            Err(EmbeddingError::CountMismatch {
                requested: 2,
                received: 1
            })
        ));
    }

    #[tokio::test]
    async fn http_429_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_string("too many requests"))
            .mount(&server)
            .await;

        let embedder = OpenAiCompatibleEmbedder::for_endpoint(
            format!("{}/embeddings", server.uri()),
            "test-model".to_string(),
        );
        let result = embedder.embed_query("q").await;
        assert!(matches!(result, Err(EmbeddingError::RateLimited(_))));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = EmbeddingProviderConfig::from_json(&serde_json::json!({
            "provider": "carrier-pigeon",
            "model_name": "v1"
        }))
        .unwrap();
        let result = build_embedder(&config, &EmbeddingDefaults::default());
        assert!(matches!(
            result,
            Err(EmbeddingError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn azure_requires_api_base() {
        let config = EmbeddingProviderConfig::from_json(&serde_json::json!({
            "provider": "azure",
            "model_name": "text-embedding-3-small",
            "api_key": "k"
        }))
        .unwrap();
        let result = build_embedder(&config, &EmbeddingDefaults::default());
        assert!(matches!(result, Err(EmbeddingError::Config(_))));
    }
}
