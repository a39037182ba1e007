//! # trialscreen-runtime
//!
//! Async screening runtime for trialscreen.
//!
//! `trialscreen-core` decides a record deterministically and never touches
//! the network. This crate adds what needs I/O:
//! - Remote LLM screening (Groq, Ollama) with retry, timeouts and a
//!   per-provider circuit breaker
//! - DOI full-text verification with a result cache
//! - Bulk screening with bounded concurrency
//! - Record sources (RIS / RefMan, JSON)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trialscreen_core::Criteria;
//! use trialscreen_runtime::{load_records, Orchestrator, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_file("runtime.yaml")?;
//! let criteria = Arc::new(Criteria::from_file("criteria.yaml")?.compile()?);
//! let orchestrator = Orchestrator::builder()
//!     .config(config)
//!     .criteria(criteria)
//!     .build()?;
//!
//! let screened = orchestrator.screen_all(load_records("export.ris")?).await;
//! ```

pub mod applier;
pub mod cache;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod protocol;
pub mod providers;
pub mod resilience;
pub mod sources;
pub mod verification;

pub use applier::{DecisionApplier, LoggingApplier};
pub use cache::VerificationCache;
pub use config::{
    ConfigError, ProviderSettings, RetryConfig, RuntimeConfig, ScreeningMode, VerificationConfig,
};
pub use llm::LlmScreener;
pub use orchestrator::{
    provider_from_config, Orchestrator, OrchestratorBuilder, RuntimeError, ScreenedRecord,
};
pub use protocol::{parse_response, PROTOCOL_VERSION};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderRegistry, Role, TokenUsage,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, FallbackStrategy};
pub use sources::{load_records, RecordSourceError};
pub use verification::{DocumentFetcher, DoiVerifier, FetchError, FetchedDocument, HttpFetcher};
