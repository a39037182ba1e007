//! Decision appliers.
//!
//! An applier pushes a finished decision somewhere outside the engine, such
//! as a screening platform UI. Failures never change the decision; the
//! applier only reports whether it succeeded.

use async_trait::async_trait;
use trialscreen_core::{Record, ScreeningResult};

/// Capability to apply a decision downstream.
#[async_trait]
pub trait DecisionApplier: Send + Sync {
    /// Apply `result` for `record`. Returns whether it was applied.
    async fn apply_decision(&self, record: &Record, result: &ScreeningResult) -> bool;

    fn name(&self) -> &str;
}

/// Logs each decision at info level.
#[derive(Debug, Clone, Default)]
pub struct LoggingApplier;

#[async_trait]
impl DecisionApplier for LoggingApplier {
    async fn apply_decision(&self, record: &Record, result: &ScreeningResult) -> bool {
        tracing::info!(
            title = %record.title,
            doi = %record.doi,
            decision = %result.decision,
            confidence = result.confidence,
            reasoning = %result.reasoning,
            "decision applied"
        );
        true
    }

    fn name(&self) -> &str {
        "logging"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_applier_always_applies() {
        let applier = LoggingApplier;
        let record = Record::new("Ticagrelor in STEMI", "");
        let applied = applier
            .apply_decision(&record, &ScreeningResult::include(0.9, "INCLUDED"))
            .await;
        assert!(applied);
        assert_eq!(applier.name(), "logging");
    }
}
