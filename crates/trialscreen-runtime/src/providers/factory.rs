//! Provider registry.
//!
//! Each provider type registers a factory that builds it from the JSON
//! `provider.config` block of [`RuntimeConfig`](crate::config::RuntimeConfig):
//!
//! ```yaml
//! provider:
//!   type: ollama
//!   config:
//!     base_url: http://localhost:11434
//!     model: llama3.1
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError};
use crate::config::ProviderSettings;

/// Builds one kind of provider from its config block.
pub trait ProviderFactory: Send + Sync {
    /// The `provider.type` this factory answers to.
    fn provider_type(&self) -> &'static str;

    /// Check the config block without building anything.
    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError>;

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;
}

/// Provider factories keyed by type.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<&'static str, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `groq` and `ollama`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::GroqProviderFactory));
        registry.register(Arc::new(super::OllamaProviderFactory));
        registry
    }

    /// Add a factory. A later factory for the same type replaces the earlier.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories.insert(factory.provider_type(), factory);
    }

    pub fn contains(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    pub fn provider_types(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    fn factory(&self, provider_type: &str) -> Result<&dyn ProviderFactory, ProviderError> {
        self.factories
            .get(provider_type)
            .map(|f| f.as_ref())
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "unknown provider type '{}' (known: {})",
                    provider_type,
                    self.provider_types().join(", ")
                ))
            })
    }

    pub fn validate(&self, provider_type: &str, config: &JsonValue) -> Result<(), ProviderError> {
        self.factory(provider_type)?.validate_config(config)
    }

    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.factory(provider_type)?.create(config)
    }

    /// Validate, then build, the provider named by `settings`.
    pub fn resolve(&self, settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let factory = self.factory(&settings.kind)?;
        factory.validate_config(&settings.config)?;
        let provider = factory.create(&settings.config)?;
        tracing::debug!(provider = provider.name(), "LLM provider ready");
        Ok(provider)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
