//! Exponential backoff for remote completions.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::config::RetryConfig;
use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};

/// Backoff policy for `config`. `max_attempts` counts the first call.
pub fn backoff(config: &RetryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(config.factor)
        .with_max_times(config.max_attempts.saturating_sub(1))
}

/// Run one completion, retrying transient faults with backoff.
///
/// Each attempt is bounded by `completion.timeout`.
pub async fn complete_with_retry(
    provider: &dyn LlmProvider,
    messages: &[ChatMessage],
    completion: &CompletionConfig,
    retry: &RetryConfig,
) -> Result<CompletionResponse, ProviderError> {
    let attempt = move || async move {
        tokio::time::timeout(completion.timeout, provider.complete(messages.to_vec(), completion))
            .await
            .map_err(|_| ProviderError::Timeout(completion.timeout))?
    };

    attempt
        .retry(backoff(retry))
        .when(|e: &ProviderError| e.is_retryable())
        .notify(|e: &ProviderError, delay: Duration| {
            tracing::warn!(
                provider = provider.name(),
                error = %e,
                delay = ?delay,
                "transient provider fault, retrying"
            );
        })
        .await
}
