//! Resilience patterns for trialscreen-runtime.
//!
//! This module provides:
//! - Circuit breaker keyed by provider name
//! - Retry with exponential backoff
//! - Fallback strategy for failed LLM calls

mod circuit_breaker;
mod fallback;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use fallback::FallbackStrategy;
pub use retry::{backoff, complete_with_retry};
