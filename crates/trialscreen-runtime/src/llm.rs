//! Remote LLM screening of a single record.
//!
//! One call per record: system prompt, screening prompt, then the response
//! is parsed with the tagged-line protocol. Transient faults are retried
//! with backoff; repeated failures open the provider's circuit.

use std::sync::Arc;

use trialscreen_core::{Criteria, Record, ScreeningResult};

use crate::config::RetryConfig;
use crate::prompts::{screening_prompt, SYSTEM_PROMPT};
use crate::protocol::parse_response;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};
use crate::resilience::{complete_with_retry, CircuitBreaker, CircuitBreakerConfig};

/// Screens records with a remote LLM provider.
pub struct LlmScreener {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    retry: RetryConfig,
    breaker: CircuitBreaker,
}

impl LlmScreener {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        completion: CompletionConfig,
        retry: RetryConfig,
        breaker: CircuitBreakerConfig,
    ) -> Self {
        Self {
            provider,
            completion,
            retry,
            breaker: CircuitBreaker::new(breaker),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Screen one record. Errors once retries are exhausted or while the
    /// provider's circuit is open.
    pub async fn screen(
        &self,
        record: &Record,
        criteria: &Criteria,
    ) -> Result<ScreeningResult, ProviderError> {
        let name = self.provider.name();
        if self.breaker.is_open(name) {
            return Err(ProviderError::CircuitOpen(name.to_string()));
        }

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(screening_prompt(record, criteria)),
        ];

        match complete_with_retry(self.provider.as_ref(), &messages, &self.completion, &self.retry)
            .await
        {
            Ok(response) => {
                self.breaker.record_success(name);
                tracing::debug!(
                    provider = name,
                    model = %response.model,
                    tokens = response.usage.total(),
                    "completion received"
                );
                Ok(parse_response(&response.content))
            }
            Err(e) => {
                self.breaker.record_failure(name);
                tracing::warn!(provider = name, title = %record.title, error = %e, "LLM screening failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for LlmScreener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmScreener")
            .field("provider", &self.provider.name())
            .field("completion", &self.completion)
            .field("retry", &self.retry)
            .field("breaker", &self.breaker)
            .finish()
    }
}
