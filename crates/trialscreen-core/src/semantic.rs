//! Semantic provider adapter.
//!
//! Wraps an opaque classification backend behind [`AxisClassifier`]. A
//! backend answer replaces the deterministic extractor for that axis only
//! when it is available and at least [`SEMANTIC_CONFIDENCE_FLOOR`]
//! confident. Otherwise the rules are authoritative.

use thiserror::Error;

use crate::extractors::{DesignExtractor, InterventionExtractor, PopulationExtractor, SignalExtractor};
use crate::types::{Axis, AxisSignal, AxisSignals, DesignType, InterventionType, PopulationType};

/// Minimum backend confidence for its signal to be used.
pub const SEMANTIC_CONFIDENCE_FLOOR: f64 = 0.5;

/// Errors a classification backend can report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Backend not loaded or not reachable. Triggers the deterministic fallback.
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    /// Backend ran and failed.
    #[error("Classifier failed: {0}")]
    Failed(String),
}

/// A pretrained classifier for the three axes.
pub trait AxisClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn classify_design(&self, text: &str) -> Result<AxisSignal<DesignType>, BackendError>;

    fn classify_intervention(&self, text: &str)
        -> Result<AxisSignal<InterventionType>, BackendError>;

    fn classify_population(&self, text: &str) -> Result<AxisSignal<PopulationType>, BackendError>;
}

fn resolve<L, E>(
    axis: Axis,
    backend: &str,
    answer: Result<AxisSignal<L>, BackendError>,
    extractor: &E,
    text: &str,
) -> Result<AxisSignal<L>, BackendError>
where
    E: SignalExtractor<Label = L>,
{
    match answer {
        Ok(signal) if signal.confidence >= SEMANTIC_CONFIDENCE_FLOOR => Ok(signal),
        Ok(signal) => {
            tracing::debug!(
                %axis,
                backend,
                confidence = signal.confidence,
                "semantic signal below floor, using rules"
            );
            Ok(extractor.extract(text))
        }
        Err(BackendError::Unavailable(reason)) => {
            tracing::debug!(%axis, backend, %reason, "classifier unavailable, using rules");
            Ok(extractor.extract(text))
        }
        Err(e) => Err(e),
    }
}

/// Produce all three axis signals, preferring the backend when it qualifies.
///
/// `Unavailable` and low-confidence answers fall back per axis; `Failed`
/// propagates.
pub fn classify_axes(
    classifier: Option<&dyn AxisClassifier>,
    text: &str,
) -> Result<AxisSignals, BackendError> {
    let Some(classifier) = classifier else {
        return Ok(crate::extractors::extract_all(text));
    };

    let name = classifier.name();
    Ok(AxisSignals {
        design: resolve(
            Axis::StudyDesign,
            name,
            classifier.classify_design(text),
            &DesignExtractor::new(),
            text,
        )?,
        intervention: resolve(
            Axis::Intervention,
            name,
            classifier.classify_intervention(text),
            &InterventionExtractor::new(),
            text,
        )?,
        population: resolve(
            Axis::Population,
            name,
            classifier.classify_population(text),
            &PopulationExtractor::new(),
            text,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        confidence: f64,
        error: Option<BackendError>,
    }

    impl AxisClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn classify_design(&self, _text: &str) -> Result<AxisSignal<DesignType>, BackendError> {
            match &self.error {
                Some(e) => Err(e.clone()),
                None => Ok(AxisSignal::new(DesignType::Review, self.confidence, "model")),
            }
        }

        fn classify_intervention(
            &self,
            _text: &str,
        ) -> Result<AxisSignal<InterventionType>, BackendError> {
            Ok(AxisSignal::new(InterventionType::Unclear, self.confidence, "model"))
        }

        fn classify_population(
            &self,
            _text: &str,
        ) -> Result<AxisSignal<PopulationType>, BackendError> {
            Err(BackendError::Unavailable("no population head".into()))
        }
    }

    const TEXT: &str = "a randomized double-blind trial of aspirin and clopidogrel in stemi and nstemi";

    #[test]
    fn test_no_classifier_uses_rules() {
        let signals = classify_axes(None, TEXT).unwrap();
        assert_eq!(signals.design.label, DesignType::Rct);
    }

    #[test]
    fn test_confident_backend_wins() {
        let classifier = FixedClassifier { confidence: 0.9, error: None };
        let signals = classify_axes(Some(&classifier), TEXT).unwrap();
        assert_eq!(signals.design.label, DesignType::Review);
        assert_eq!(signals.intervention.label, InterventionType::Unclear);
        // population head unavailable
        assert_eq!(signals.population.label, PopulationType::MiPatients);
    }

    #[test]
    fn test_low_confidence_falls_back() {
        let classifier = FixedClassifier { confidence: 0.3, error: None };
        let signals = classify_axes(Some(&classifier), TEXT).unwrap();
        assert_eq!(signals.design.label, DesignType::Rct);
        assert_eq!(signals.intervention.label, InterventionType::Pharmacological);
    }

    #[test]
    fn test_unavailable_falls_back() {
        let classifier = FixedClassifier {
            confidence: 0.9,
            error: Some(BackendError::Unavailable("model not loaded".into())),
        };
        let signals = classify_axes(Some(&classifier), TEXT).unwrap();
        assert_eq!(signals.design.label, DesignType::Rct);
    }

    #[test]
    fn test_failure_propagates() {
        let classifier = FixedClassifier {
            confidence: 0.9,
            error: Some(BackendError::Failed("tensor shape mismatch".into())),
        };
        let err = classify_axes(Some(&classifier), TEXT).unwrap_err();
        assert!(err.to_string().contains("tensor shape mismatch"));
    }
}
