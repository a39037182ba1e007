//! Bulk screening orchestrator.
//!
//! For each record:
//! 1. Verify the DOI full text (when enabled and the record has a DOI)
//! 2. Run the stringent pipeline on the blocking pool
//! 3. Consult the remote LLM in blended or LLM mode
//! 4. Hand the decision to the applier, if any
//!
//! Records are screened concurrently up to `concurrency`; output order
//! matches input order. No single record can fail the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;

use trialscreen_core::{
    blend, AxisClassifier, CompiledCriteria, Record, Screener, ScreenerConfig, ScreeningError,
    ScreeningResult, Verification,
};

use crate::applier::DecisionApplier;
use crate::config::{ConfigError, RuntimeConfig, ScreeningMode};
use crate::llm::LlmScreener;
use crate::providers::{LlmProvider, ProviderError, ProviderRegistry};
use crate::verification::{DocumentFetcher, DoiVerifier};

/// Errors from building the orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("{0}")]
    ProviderNotConfigured(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("invalid runtime config: {0}")]
    Config(#[from] ConfigError),
}

/// One screened record.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenedRecord {
    pub record: Record,
    pub result: ScreeningResult,
    pub verification: Verification,

    /// Applier outcome; `None` without an applier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,

    pub screened_at: DateTime<Utc>,
}

/// Screens records according to the runtime configuration.
pub struct Orchestrator {
    config: RuntimeConfig,
    screener: Screener,
    criteria: Arc<CompiledCriteria>,
    llm: Option<LlmScreener>,
    verifier: Option<DoiVerifier>,
    applier: Option<Arc<dyn DecisionApplier>>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn mode(&self) -> ScreeningMode {
        self.config.mode
    }

    /// Screen one record. Never fails.
    pub async fn screen_one(&self, record: Record) -> ScreenedRecord {
        let verification = match &self.verifier {
            Some(verifier) if record.has_doi() => verifier.verify(&record.doi).await,
            _ => Verification::Unknown,
        };

        let stringent = self.screen_stringent(&record, verification).await;

        let result = match (self.config.mode, &self.llm) {
            (ScreeningMode::Llm, Some(llm)) => {
                match llm.screen(&record, self.criteria.criteria()).await {
                    Ok(result) => result,
                    Err(e) => self.config.llm_fallback.resolve(&e, stringent),
                }
            }
            (ScreeningMode::Blended, Some(llm)) => {
                match llm.screen(&record, self.criteria.criteria()).await {
                    Ok(semantic) => blend(&semantic, &stringent),
                    Err(e) => {
                        tracing::debug!(error = %e, "blended mode using rule-based result");
                        stringent
                    }
                }
            }
            _ => stringent,
        };

        tracing::debug!(
            title = %record.title,
            decision = %result.decision,
            confidence = result.confidence,
            "record screened"
        );

        let applied = match &self.applier {
            Some(applier) => Some(applier.apply_decision(&record, &result).await),
            None => None,
        };

        ScreenedRecord {
            record,
            result,
            verification,
            applied,
            screened_at: Utc::now(),
        }
    }

    /// Screen every record with bounded concurrency, preserving order.
    pub async fn screen_all(&self, records: Vec<Record>) -> Vec<ScreenedRecord> {
        tracing::info!(
            records = records.len(),
            mode = %self.config.mode,
            concurrency = self.config.concurrency,
            "screening started"
        );

        stream::iter(records)
            .map(|record| self.screen_one(record))
            .buffered(self.config.concurrency)
            .collect()
            .await
    }

    async fn screen_stringent(&self, record: &Record, verification: Verification) -> ScreeningResult {
        let screener = self.screener.clone();
        let criteria = Arc::clone(&self.criteria);
        let owned = record.clone();

        tokio::task::spawn_blocking(move || {
            screener.screen_with_verification(&owned, &criteria, verification)
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(title = %record.title, error = %e, "screening task failed");
            ScreeningResult::from_fault(&ScreeningError::Internal(e.to_string()))
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("llm", &self.llm)
            .field("verifier", &self.verifier)
            .field("applier", &self.applier.as_ref().map(|a| a.name().to_string()))
            .finish()
    }
}

/// Provider named by `config.provider`, built through the default registry.
pub fn provider_from_config(config: &RuntimeConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    ProviderRegistry::builtin().resolve(&config.provider)
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    config: RuntimeConfig,
    criteria: Option<Arc<CompiledCriteria>>,
    provider: Option<Arc<dyn LlmProvider>>,
    fetcher: Option<Arc<dyn DocumentFetcher>>,
    applier: Option<Arc<dyn DecisionApplier>>,
    classifier: Option<Arc<dyn AxisClassifier>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            criteria: None,
            provider: None,
            fetcher: None,
            applier: None,
            classifier: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn criteria(mut self, criteria: Arc<CompiledCriteria>) -> Self {
        self.criteria = Some(criteria);
        self
    }

    /// Set the LLM provider. Required in blended and LLM modes.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the HTTP fetcher used for DOI verification.
    pub fn fetcher(mut self, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn applier(mut self, applier: Arc<dyn DecisionApplier>) -> Self {
        self.applier = Some(applier);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn AxisClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn build(self) -> Result<Orchestrator, RuntimeError> {
        let config = self.config;
        config.validate()?;

        let llm = match (config.mode.needs_provider(), self.provider) {
            (true, Some(provider)) => Some(LlmScreener::new(
                provider,
                config.completion.clone(),
                config.retry.clone(),
                config.circuit_breaker.clone(),
            )),
            (true, None) => {
                return Err(RuntimeError::ProviderNotConfigured(format!(
                    "mode '{}' requires an LLM provider",
                    config.mode
                )))
            }
            (false, _) => None,
        };

        let verifier = if config.verification.enabled {
            Some(match self.fetcher {
                Some(fetcher) => DoiVerifier::new(fetcher, config.verification.clone()),
                None => DoiVerifier::http(config.verification.clone()),
            })
        } else {
            None
        };

        let screener = Screener::new(ScreenerConfig {
            min_title_len: config.min_title_len,
            classifier: self.classifier,
        });

        Ok(Orchestrator {
            screener,
            criteria: self
                .criteria
                .unwrap_or_else(|| Arc::new(CompiledCriteria::empty())),
            llm,
            verifier,
            applier: self.applier,
            config,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, TokenUsage};
    use crate::resilience::FallbackStrategy;
    use crate::verification::{FetchError, FetchedDocument};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;
    use trialscreen_core::Decision;

    struct MockProvider {
        reply: Result<String, ProviderError>,
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.reply.clone().map(|content| CompletionResponse {
                content,
                usage: TokenUsage::default(),
                model: "mock".to_string(),
                stop_reason: Some("stop".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    /// Serves one non-RCT page for every URL.
    struct ObservationalFetcher;

    #[async_trait]
    impl DocumentFetcher for ObservationalFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedDocument, FetchError> {
            Ok(FetchedDocument {
                status: 200,
                body: format!(
                    "<html><body>{}<p>A retrospective registry analysis of MI patients.</p></body></html>",
                    "<div>site navigation</div>".repeat(60)
                ),
            })
        }
    }

    #[derive(Default)]
    struct RecordingApplier {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DecisionApplier for RecordingApplier {
        async fn apply_decision(&self, record: &Record, _result: &ScreeningResult) -> bool {
            self.seen.lock().push(record.title.clone());
            true
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn rct_record() -> Record {
        Record::new(
            "Effect of atorvastatin on cardiovascular outcomes in patients with acute coronary \
             syndromes: a randomized controlled trial",
            "We randomized 2,847 patients with acute MI to atorvastatin 80mg daily or matching \
             placebo. The primary endpoint was MACE at 12 months.",
        )
    }

    fn review_record() -> Record {
        Record::new(
            "Antiplatelet therapy after myocardial infarction: a systematic review and meta-analysis",
            "We pooled 12 trials of P2Y12 inhibitors.",
        )
    }

    fn config(mode: ScreeningMode) -> RuntimeConfig {
        RuntimeConfig {
            mode,
            retry: crate::config::RetryConfig {
                max_attempts: 1,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                factor: 2.0,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_stringent_mode_needs_no_provider() {
        let orchestrator = Orchestrator::builder().build().unwrap();
        let screened = orchestrator.screen_one(rct_record()).await;
        assert_eq!(screened.result.decision, Decision::Include);
        assert_eq!(screened.verification, Verification::Unknown);
        assert_eq!(screened.applied, None);
    }

    #[tokio::test]
    async fn test_llm_mode_requires_provider() {
        let err = Orchestrator::builder()
            .config(config(ScreeningMode::Llm))
            .build()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ProviderNotConfigured(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let err = Orchestrator::builder()
            .config(RuntimeConfig {
                concurrency: 0,
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[tokio::test]
    async fn test_llm_mode_uses_provider_result() {
        let orchestrator = Orchestrator::builder()
            .config(config(ScreeningMode::Llm))
            .provider(Arc::new(MockProvider {
                reply: Ok("DECISION: MAYBE\nCONFIDENCE: 0.6\nREASONING: unclear population".into()),
            }))
            .build()
            .unwrap();

        let screened = orchestrator.screen_one(rct_record()).await;
        assert_eq!(screened.result.decision, Decision::Maybe);
        assert_eq!(screened.result.reasoning, "unclear population");
    }

    #[tokio::test]
    async fn test_llm_mode_fallbacks() {
        let failing = || Arc::new(MockProvider {
            reply: Err(ProviderError::AuthError),
        });

        let orchestrator = Orchestrator::builder()
            .config(config(ScreeningMode::Llm))
            .provider(failing())
            .build()
            .unwrap();
        let screened = orchestrator.screen_one(review_record()).await;
        assert_eq!(screened.result.decision, Decision::Maybe);
        assert_eq!(screened.result.confidence, 0.5);

        let orchestrator = Orchestrator::builder()
            .config(RuntimeConfig {
                llm_fallback: FallbackStrategy::Stringent,
                ..config(ScreeningMode::Llm)
            })
            .provider(failing())
            .build()
            .unwrap();
        let screened = orchestrator.screen_one(review_record()).await;
        assert_eq!(screened.result.decision, Decision::Exclude);
    }

    #[tokio::test]
    async fn test_blended_mode() {
        let orchestrator = Orchestrator::builder()
            .config(config(ScreeningMode::Blended))
            .provider(Arc::new(MockProvider {
                reply: Ok("DECISION: INCLUDE\nCONFIDENCE: 0.9\nREASONING: primary RCT".into()),
            }))
            .build()
            .unwrap();
        let screened = orchestrator.screen_one(rct_record()).await;
        assert_eq!(screened.result.decision, Decision::Include);
        assert_eq!(screened.result.reasoning, "Semantic analysis: primary RCT");

        // Provider failure: rule-based result unchanged
        let orchestrator = Orchestrator::builder()
            .config(config(ScreeningMode::Blended))
            .provider(Arc::new(MockProvider {
                reply: Err(ProviderError::HttpError("reset".into())),
            }))
            .build()
            .unwrap();
        let screened = orchestrator.screen_one(review_record()).await;
        let direct = trialscreen_core::screen(&review_record(), &CompiledCriteria::empty());
        assert_eq!(screened.result, direct);
    }

    #[tokio::test]
    async fn test_verification_refutes_rct() {
        let orchestrator = Orchestrator::builder()
            .config(RuntimeConfig {
                verification: crate::config::VerificationConfig {
                    enabled: true,
                    ..Default::default()
                },
                ..Default::default()
            })
            .fetcher(Arc::new(ObservationalFetcher))
            .build()
            .unwrap();

        let screened = orchestrator.screen_one(rct_record().with_doi("10.1000/obs")).await;
        assert_eq!(screened.verification, Verification::ConfirmedNonRct);
        assert_eq!(screened.result.decision, Decision::Exclude);

        // Records without a DOI skip verification
        let screened = orchestrator.screen_one(rct_record()).await;
        assert_eq!(screened.verification, Verification::Unknown);
    }

    #[tokio::test]
    async fn test_screen_all_preserves_order_and_applies() {
        let applier = Arc::new(RecordingApplier::default());
        let orchestrator = Orchestrator::builder()
            .config(RuntimeConfig {
                concurrency: 2,
                ..Default::default()
            })
            .applier(applier.clone())
            .build()
            .unwrap();

        let records = vec![rct_record(), review_record(), Record::new("", ""), rct_record()];
        let screened = orchestrator.screen_all(records.clone()).await;

        assert_eq!(screened.len(), 4);
        for (out, input) in screened.iter().zip(&records) {
            assert_eq!(out.record, *input);
            assert_eq!(out.applied, Some(true));
        }
        assert_eq!(screened[1].result.decision, Decision::Exclude);
        assert_eq!(screened[2].result.decision, Decision::Exclude);
        assert_eq!(applier.seen.lock().len(), 4);
    }
}
