//! Population Extractor
//!
//! **Question**: Are the participants myocardial infarction patients?
//!
//! This axis is coarse. The stringent MI gate in [`crate::rules::mi_gate`]
//! is the authoritative population check; this signal only feeds the
//! aggregator's exclusion accumulation and confidence averaging.

use lazy_static::lazy_static;

use crate::types::{Axis, AxisSignal, PopulationType};

use super::patterns::{join_first, PatternSet};
use super::{evidence_for, SignalExtractor};

lazy_static! {
    static ref MI_TERMS: PatternSet = PatternSet::phrases(&[
        "myocardial infarction", "mi", "stemi", "nstemi", "heart attack",
        "st-elevation myocardial infarction", "non-st-elevation myocardial infarction",
        "acs", "post-mi", "after myocardial infarction",
    ])
    .with_regexes(&[("acute coronary syndrome", r"\bacute\s+coronary\s+syndromes?\b")]);

    static ref CARDIAC_TERMS: PatternSet = PatternSet::phrases(&[
        "cardiovascular", "cardiac", "coronary", "heart disease",
        "coronary artery disease", "cad", "heart failure", "arrhythmia",
    ]);

    static ref NON_CARDIAC_TERMS: PatternSet = PatternSet::phrases(&[
        "diabetes", "kidney disease", "cancer", "stroke", "lung disease",
        "psychiatric", "neurological", "orthopedic", "dermatologic",
    ]);
}

/// Classifies the study population.
pub struct PopulationExtractor;

impl PopulationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PopulationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalExtractor for PopulationExtractor {
    type Label = PopulationType;

    fn axis(&self) -> Axis {
        Axis::Population
    }

    fn question(&self) -> &'static str {
        "Are the participants myocardial infarction patients?"
    }

    fn extract(&self, text: &str) -> AxisSignal<PopulationType> {
        let mi = MI_TERMS.matches(text);
        let cardiac = CARDIAC_TERMS.matches(text);
        let non_cardiac = NON_CARDIAC_TERMS.matches(text);

        let names = |m: &[super::PatternMatch]| {
            join_first(&m.iter().map(|p| p.label.clone()).collect::<Vec<_>>(), 3)
        };

        let signal = if mi.len() >= 2 {
            AxisSignal::new(
                PopulationType::MiPatients,
                0.95,
                format!("Clear MI patient population ({})", names(&mi)),
            )
            .with_evidence(evidence_for(&mi, "MI term"))
        } else if mi.len() == 1 {
            AxisSignal::new(
                PopulationType::LikelyMiPatients,
                0.80,
                format!("Likely MI patient population ({})", mi[0].label),
            )
            .with_evidence(evidence_for(&mi, "MI term"))
        } else if cardiac.len() >= 2 && non_cardiac.is_empty() {
            AxisSignal::new(
                PopulationType::CardiacPatients,
                0.75,
                format!("General cardiac patient population ({})", names(&cardiac)),
            )
            .with_evidence(evidence_for(&cardiac, "cardiac term"))
        } else if !non_cardiac.is_empty() {
            AxisSignal::new(
                PopulationType::NonCardiac,
                0.80,
                format!("Non-cardiac patient population ({})", names(&non_cardiac)),
            )
            .with_evidence(evidence_for(&non_cardiac, "non-cardiac term"))
        } else if !cardiac.is_empty() {
            AxisSignal::new(
                PopulationType::PossibleCardiac,
                0.60,
                format!("Possible cardiac patient population ({})", names(&cardiac)),
            )
            .with_evidence(evidence_for(&cardiac, "cardiac term"))
        } else {
            AxisSignal::new(PopulationType::Unclear, 0.50, "Population unclear")
        };

        signal
            .with_count("mi", mi.len())
            .with_count("cardiac", cardiac.len())
            .with_count("non_cardiac", non_cardiac.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> AxisSignal<PopulationType> {
        PopulationExtractor::new().extract(&text.to_lowercase())
    }

    #[test]
    fn test_two_mi_terms() {
        let signal = extract("Patients with acute MI or acute coronary syndromes");
        assert_eq!(signal.label, PopulationType::MiPatients);
        assert_eq!(signal.confidence, 0.95);
    }

    #[test]
    fn test_one_mi_term() {
        let signal = extract("Outcomes after STEMI");
        assert_eq!(signal.label, PopulationType::LikelyMiPatients);
        assert_eq!(signal.confidence, 0.80);
    }

    #[test]
    fn test_mi_is_word_bounded() {
        let signal = extract("Midodrine in mild hypotension");
        assert_eq!(signal.count("mi"), 0);
    }

    #[test]
    fn test_cardiac_population() {
        let signal = extract("Coronary artery disease and heart failure outcomes");
        assert_eq!(signal.label, PopulationType::CardiacPatients);
        assert_eq!(signal.confidence, 0.75);
    }

    #[test]
    fn test_non_cardiac_beats_single_cardiac_term() {
        let signal = extract("Cardiovascular outcomes in type 2 diabetes");
        assert_eq!(signal.label, PopulationType::NonCardiac);
        assert_eq!(signal.confidence, 0.80);
    }

    #[test]
    fn test_possible_cardiac() {
        let signal = extract("Cardiac imaging protocols");
        assert_eq!(signal.label, PopulationType::PossibleCardiac);
        assert_eq!(signal.confidence, 0.60);
    }

    #[test]
    fn test_unclear() {
        let signal = extract("Wound healing in adults");
        assert_eq!(signal.label, PopulationType::Unclear);
        assert_eq!(signal.confidence, 0.50);
    }
}
