//! # trialscreen-core
//!
//! Deterministic screening engine for randomized controlled trials of
//! pharmacological therapy in myocardial infarction patients.
//!
//! This crate answers, for one bibliographic record:
//! - Is it a primary RCT?
//! - Are the participants current or previous MI patients?
//! - Is the intervention under study a drug?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same record and criteria always produce the same result
//! 2. **No network calls**: Remote LLMs and DOI lookups live in `trialscreen-runtime`
//! 3. **Traceable**: Every decision cites the criterion that drove it
//! 4. **Total**: Every record gets exactly one result; internal faults become MAYBE
//!
//! ## Example
//!
//! ```rust,ignore
//! use trialscreen_core::{Criteria, Record, Screener};
//!
//! let criteria = Criteria::from_file("criteria.yaml")?.compile()?;
//! let record = Record::new(
//!     "Ticagrelor versus clopidogrel in acute coronary syndromes",
//!     "We randomly assigned 18,624 patients with acute MI...",
//! );
//! let result = Screener::default().screen(&record, &criteria);
//! println!("{}: {:.2} ({})", result.decision, result.confidence, result.reasoning);
//! ```

pub mod aggregator;
pub mod blend;
pub mod criteria;
pub mod evidence;
pub mod export;
pub mod extractors;
pub mod rules;
pub mod semantic;
pub mod types;

// Re-export main types at crate root
pub use aggregator::Aggregator;
pub use blend::blend;
pub use criteria::{CompiledCriteria, Criteria, CriteriaError};
pub use evidence::{Evidence, EvidenceSource};
pub use export::{ExportRow, Summary};
pub use rules::{RctScore, RuleFindings};
pub use semantic::{AxisClassifier, BackendError};
pub use types::{
    Axis, AxisSignal, AxisSignals, Decision, DesignType, InterventionType, PopulationType,
    Record, ScreeningReport, ScreeningResult, ScreeningStage, Verification,
};

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

/// Below this confidence the criteria-keyword screener replaces the
/// stringent result.
pub const FALLBACK_CONFIDENCE_FLOOR: f64 = 0.5;

/// Faults raised around the pipeline, such as a screening task that
/// panicked. They degrade to [`ScreeningResult::from_fault`].
#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Construction-time screening settings.
#[derive(Clone)]
pub struct ScreenerConfig {
    /// Titles shorter than this (trimmed, in characters) are excluded
    pub min_title_len: usize,

    /// Optional pretrained classifier consulted before the extractors
    pub classifier: Option<Arc<dyn AxisClassifier>>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            min_title_len: aggregator::MIN_TITLE_LEN,
            classifier: None,
        }
    }
}

impl std::fmt::Debug for ScreenerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenerConfig")
            .field("min_title_len", &self.min_title_len)
            .field("classifier", &self.classifier.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}

/// The screening pipeline: title check, MI gate, axis signals, aggregation,
/// criteria fallback.
#[derive(Debug, Clone, Default)]
pub struct Screener {
    config: ScreenerConfig,
}

impl Screener {
    pub fn new(config: ScreenerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Screen one record.
    pub fn screen(&self, record: &Record, criteria: &CompiledCriteria) -> ScreeningResult {
        self.screen_with_verification(record, criteria, Verification::Unknown)
    }

    /// Screen one record with a document verification result already known.
    pub fn screen_with_verification(
        &self,
        record: &Record,
        criteria: &CompiledCriteria,
        verification: Verification,
    ) -> ScreeningResult {
        self.screen_detailed(record, criteria, verification).result
    }

    /// Screen one record and keep every intermediate finding.
    ///
    /// A classifier that fails outright is treated like a missing backend:
    /// the criteria-keyword screener decides the record.
    pub fn screen_detailed(
        &self,
        record: &Record,
        criteria: &CompiledCriteria,
        verification: Verification,
    ) -> ScreeningReport {
        let aggregator = Aggregator::with_min_title_len(self.config.min_title_len);
        let report = |result: ScreeningResult,
                      stage: ScreeningStage,
                      signals: Option<AxisSignals>,
                      rules: Option<RuleFindings>,
                      drug_mi_pattern: Option<String>| ScreeningReport {
            result,
            stage,
            signals,
            rules,
            drug_mi_pattern,
            verification,
            screened_at: Utc::now(),
        };

        if let Some(result) = aggregator.check_title(&record.title) {
            return report(result, ScreeningStage::TitleCheck, None, None, None);
        }

        let text = record.screening_text();
        let rules = RuleFindings::evaluate(&text, verification).with_criteria(&text, criteria);
        let drug_mi_pattern = rules::drug_mi::detect(&text);
        if let Some(pattern) = &drug_mi_pattern {
            tracing::debug!(pattern = %pattern, "drug + MI pattern");
        }

        if !rules.mi_gate.passed() {
            let result = ScreeningResult::exclude(
                rules::mi_gate::GATE_EXCLUSION_CONFIDENCE,
                rules.mi_gate.exclusion_reason(),
            );
            return report(
                result,
                ScreeningStage::MiGate,
                None,
                Some(rules),
                drug_mi_pattern,
            );
        }

        let signals = match semantic::classify_axes(self.config.classifier.as_deref(), &text) {
            Ok(signals) => signals,
            Err(e) => {
                tracing::warn!(title = %record.title, error = %e, "classifier failed, using criteria screener");
                let result = rules::criteria_screen::screen(&text, criteria, verification);
                return report(
                    result,
                    ScreeningStage::CriteriaFallback,
                    None,
                    Some(rules),
                    drug_mi_pattern,
                );
            }
        };
        let result = aggregator.aggregate(&signals, &rules);

        let (result, stage) = if result.confidence < FALLBACK_CONFIDENCE_FLOOR {
            tracing::debug!(
                confidence = result.confidence,
                "low-confidence aggregation, using criteria screener"
            );
            (
                rules::criteria_screen::screen(&text, criteria, verification),
                ScreeningStage::CriteriaFallback,
            )
        } else {
            (result, ScreeningStage::Aggregation)
        };

        report(result, stage, Some(signals), Some(rules), drug_mi_pattern)
    }
}

/// Screen one record with default settings.
pub fn screen(record: &Record, criteria: &CompiledCriteria) -> ScreeningResult {
    Screener::default().screen(record, criteria)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> CompiledCriteria {
        CompiledCriteria::empty()
    }

    #[test]
    fn test_basic_inclusion() {
        let record = Record::new(
            "Metoprolol in acute myocardial infarction: a randomized controlled trial",
            "Patients with acute MI received metoprolol 50 mg or placebo.",
        );
        let result = screen(&record, &criteria());
        assert_eq!(result.decision, Decision::Include);
        assert!(result.confidence >= 0.80);
    }

    #[test]
    fn test_detailed_report_stages() {
        let screener = Screener::default();

        let report = screener.screen_detailed(&Record::new("", ""), &criteria(), Verification::Unknown);
        assert_eq!(report.stage, ScreeningStage::TitleCheck);
        assert!(report.rules.is_none());

        let report = screener
            .screen_detailed(
                &Record::new("Aspirin for primary prevention of cardiovascular events", ""),
                &criteria(),
                Verification::Unknown,
            );
        assert_eq!(report.stage, ScreeningStage::MiGate);
        assert!(report.signals.is_none());
    }

    struct BrokenClassifier;

    impl AxisClassifier for BrokenClassifier {
        fn name(&self) -> &str {
            "broken"
        }

        fn classify_design(&self, _: &str) -> Result<AxisSignal<DesignType>, BackendError> {
            Err(BackendError::Failed("weights corrupted".into()))
        }

        fn classify_intervention(
            &self,
            _: &str,
        ) -> Result<AxisSignal<InterventionType>, BackendError> {
            Err(BackendError::Failed("weights corrupted".into()))
        }

        fn classify_population(
            &self,
            _: &str,
        ) -> Result<AxisSignal<PopulationType>, BackendError> {
            Err(BackendError::Failed("weights corrupted".into()))
        }
    }

    fn stemi_rct() -> Record {
        Record::new(
            "Atorvastatin in STEMI: a randomized placebo-controlled trial",
            "We conducted a randomized, placebo-controlled trial in patients with STEMI. \
             Atorvastatin 80 mg was compared with placebo; the primary endpoint was mortality.",
        )
    }

    #[test]
    fn test_classifier_failure_uses_criteria_screener() {
        let screener = Screener::new(ScreenerConfig {
            classifier: Some(Arc::new(BrokenClassifier)),
            ..Default::default()
        });

        let report = screener.screen_detailed(&stemi_rct(), &criteria(), Verification::Unknown);
        assert_eq!(report.stage, ScreeningStage::CriteriaFallback);
        assert!(report.signals.is_none());
        assert_eq!(report.result.decision, Decision::Include);
        assert_eq!(report.result.confidence, 0.90);
        assert!(report.result.reasoning.starts_with("All required criteria met"));
    }

    #[test]
    fn test_criteria_decide_after_classifier_failure() {
        let screener = Screener::new(ScreenerConfig {
            classifier: Some(Arc::new(BrokenClassifier)),
            ..Default::default()
        });
        let strict = Criteria {
            study_types_exclude: vec!["placebo-controlled".into()],
            exclude_keywords: vec!["mortality".into()],
            ..Default::default()
        }
        .compile()
        .unwrap();

        let result = screener.screen(&stemi_rct(), &strict);
        assert_eq!(result.decision, Decision::Exclude);
        assert_eq!(
            result.reasoning,
            "Contains excluded keyword: mortality; Excluded study type: placebo-controlled"
        );
    }

    #[test]
    fn test_config_debug_hides_classifier_internals() {
        let config = ScreenerConfig {
            classifier: Some(Arc::new(BrokenClassifier)),
            ..Default::default()
        };
        assert!(format!("{:?}", config).contains("broken"));
    }
}
