//! Local Ollama provider (`/api/generate`, non-streaming).

use super::{
    factory::ProviderFactory, status_error, transport_error, ChatMessage, CompletionConfig,
    CompletionResponse, LlmProvider, ProviderError, Role, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama server provider. A `model` set in provider config takes
/// precedence over `completion.model`.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    model: Option<String>,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: None,
            client: reqwest::Client::new(),
        }
    }

    /// `base_url` and optional `model` from config; `OLLAMA_BASE_URL` is the
    /// fallback for the URL.
    pub fn from_config(config: &JsonValue) -> Self {
        let base_url = config["base_url"]
            .as_str()
            .map(str::to_string)
            .or_else(|| std::env::var("OLLAMA_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut provider = Self::new(base_url);
        provider.model = config["model"].as_str().map(str::to_string);
        provider
    }

    fn model<'a>(&'a self, config: &'a CompletionConfig) -> &'a str {
        self.model.as_deref().unwrap_or(&config.model)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    response: String,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

/// Split chat messages into Ollama's `system` and `prompt` fields.
fn flatten(messages: Vec<ChatMessage>) -> (Option<String>, String) {
    let mut system = Vec::new();
    let mut prompt = Vec::new();
    for message in messages {
        if message.role == Role::System {
            system.push(message.content);
        } else {
            prompt.push(message.content);
        }
    }
    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, prompt.join("\n\n"))
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let (system, prompt) = flatten(messages);
        let request = GenerateRequest {
            model: self.model(config),
            prompt,
            system,
            stream: false,
            options: GenerateOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, config.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(CompletionResponse {
            content: body.response,
            usage: TokenUsage {
                prompt_tokens: body.prompt_eval_count,
                completion_tokens: body.eval_count,
            },
            model: body.model,
            stop_reason: body.done_reason,
        })
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Factory for Ollama providers.
///
/// ## Configuration Format
/// ```json
/// {
///   "base_url": "http://localhost:11434",   // Optional, falls back to OLLAMA_BASE_URL
///   "model": "gpt-oss:20b"                  // Optional, overrides completion.model
/// }
/// ```
pub struct OllamaProviderFactory;

impl ProviderFactory for OllamaProviderFactory {
    fn provider_type(&self) -> &'static str {
        "ollama"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.validate_config(config)?;
        Ok(Arc::new(OllamaProvider::from_config(config)))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if let Some(url) = config["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }
        Ok(())
    }
}
