//! Chat-completion backends for semantic screening.
//!
//! [`GroqProvider`] talks to Groq's OpenAI-compatible API and
//! [`OllamaProvider`] to a local Ollama server. API keys are held as
//! [`ApiCredential`] and are redacted from `Debug` output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod factory;
mod groq;
mod ollama;
pub mod secrets;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use groq::{GroqProvider, GroqProviderFactory, GROQ_API_KEY_ENV};
pub use ollama::{OllamaProvider, OllamaProviderFactory};
pub use secrets::{ApiCredential, CredentialSource};

/// Why a completion call failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    HttpError(String),

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("unreadable provider response: {0}")]
    ParseError(String),

    #[error("API key rejected")]
    AuthError,

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("circuit open for '{0}'")]
    CircuitOpen(String),
}

impl ProviderError {
    /// Whether another attempt can succeed. Only 5xx statuses count among
    /// API errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::RateLimited { .. } | Self::Timeout(_) => true,
            Self::ApiError { status, .. } => *status >= 500,
            Self::ParseError(_) | Self::AuthError | Self::NotConfigured(_) | Self::CircuitOpen(_) => {
                false
            }
        }
    }
}

/// Model parameters for one screening request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub model: String,
    /// The reply is four short lines, so this stays small.
    pub max_tokens: u32,
    pub temperature: f32,
    /// Applies to each attempt, not the whole retry sequence.
    #[serde(with = "crate::config::duration_str")]
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 200,
            temperature: 0.1,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
    /// Model that actually answered, as reported by the provider.
    pub model: String,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A chat-completion backend used for semantic screening.
///
/// The stringent pipeline in `trialscreen-core` never calls a provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Cheap readiness probe. No request is sent.
    async fn health_check(&self) -> bool;

    /// Stable name; keys the circuit breaker and tags log lines.
    fn name(&self) -> &str;
}

/// Map a transport error from reqwest.
pub(crate) fn transport_error(error: reqwest::Error, timeout: Duration) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::HttpError(error.to_string())
    }
}

/// Map a non-success HTTP status, reading `retry-after` on 429.
pub(crate) async fn status_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        return ProviderError::RateLimited { retry_after };
    }

    if status == 401 || status == 403 {
        return ProviderError::AuthError;
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["error"].as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    ProviderError::ApiError { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let value = serde_json::to_value(ChatMessage::system("screen this")).unwrap();
        assert_eq!(value["role"], "system");
        assert_eq!(ChatMessage::user("u").role, Role::User);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::RateLimited { retry_after: None }.is_retryable());
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ProviderError::HttpError("reset".into()).is_retryable());
        assert!(ProviderError::ApiError {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(!ProviderError::ApiError {
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
        assert!(!ProviderError::AuthError.is_retryable());
        assert!(!ProviderError::ParseError("eof".into()).is_retryable());
        assert!(!ProviderError::CircuitOpen("groq".into()).is_retryable());
    }

    #[test]
    fn test_completion_config_from_yaml() {
        let config: CompletionConfig =
            serde_yaml::from_str("model: llama-3.1-8b-instant\ntimeout: 45s\n").unwrap();
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.max_tokens, 200);
    }
}
