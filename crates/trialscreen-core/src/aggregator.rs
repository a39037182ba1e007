//! Aggregator: combines axis signals and rule findings into a decision.
//!
//! The policy is strict and not configurable:
//! 1. Empty or too-short title → EXCLUDE
//! 2. MI gate fails → EXCLUDE 0.95
//! 3. Any accumulated exclusion reason → EXCLUDE, confidence grows with the
//!    number of reasons and is capped at 0.95. A decisive criteria exclusion
//!    score counts as one reason
//! 4. Otherwise all three of RCT design, MI population and pharmacological
//!    intervention must hold, checked in that order
//! 5. INCLUDE only when the averaged per-criterion confidence reaches 0.80

use crate::rules::RuleFindings;
use crate::types::{
    AxisSignals, DesignType, InterventionType, PopulationType, ScreeningResult,
};

/// Default minimum trimmed title length.
pub const MIN_TITLE_LEN: usize = 10;

/// Minimum averaged confidence for an inclusion.
pub const INCLUSION_CONFIDENCE_FLOOR: f64 = 0.80;

/// Confidence of an exclusion backed by `reasons` accumulated reasons.
///
/// Monotone in `reasons` and capped at 0.95.
pub fn exclusion_confidence(reasons: usize) -> f64 {
    (0.80 + 0.05 * reasons as f64).min(0.95)
}

/// The Aggregator applies the screening policy.
pub struct Aggregator {
    min_title_len: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            min_title_len: MIN_TITLE_LEN,
        }
    }

    pub fn with_min_title_len(min_title_len: usize) -> Self {
        Self { min_title_len }
    }

    /// Title checks run before anything else. `None` means the title is usable.
    pub fn check_title(&self, title: &str) -> Option<ScreeningResult> {
        let title = title.trim();
        if title.is_empty() {
            return Some(ScreeningResult::exclude(0.95, "No title available"));
        }

        let len = title.chars().count();
        if len < self.min_title_len {
            return Some(ScreeningResult::exclude(
                0.90,
                format!("Title too short ({} chars) - likely incomplete", len),
            ));
        }

        None
    }

    /// Apply the policy after the MI gate.
    pub fn aggregate(&self, signals: &AxisSignals, rules: &RuleFindings) -> ScreeningResult {
        if !rules.mi_gate.passed() {
            return ScreeningResult::exclude(
                crate::rules::mi_gate::GATE_EXCLUSION_CONFIDENCE,
                rules.mi_gate.exclusion_reason(),
            );
        }

        let reasons = self.exclusion_reasons(signals, rules);
        if !reasons.is_empty() {
            tracing::debug!(reasons = reasons.len(), "exclusion reasons accumulated");
            return ScreeningResult::exclude(
                exclusion_confidence(reasons.len()),
                format_exclusion(&reasons),
            );
        }

        self.require_all(signals, rules)
    }

    fn exclusion_reasons(&self, signals: &AxisSignals, rules: &RuleFindings) -> Vec<String> {
        let rct_meets = rules.rct_requirement();
        let pharma_meets = rules.pharmacological.passed;
        let mut reasons = Vec::new();

        let design = &signals.design;
        if design.label == DesignType::Review || (design.label == DesignType::NonRct && !rct_meets)
        {
            reasons.push(format!("Study design: {}", design.rationale));
        }

        let intervention = &signals.intervention;
        if matches!(
            intervention.label,
            InterventionType::HealthSystem
                | InterventionType::ObservationalPharma
                | InterventionType::NonPharmacological
                | InterventionType::AdherenceBehavioral
                | InterventionType::Unclear
        ) {
            reasons.push(format!("Intervention: {}", intervention.rationale));
        }

        let population = &signals.population;
        if matches!(
            population.label,
            PopulationType::NonCardiac | PopulationType::Unclear | PopulationType::PossibleCardiac
        ) {
            reasons.push(format!("Population: {}", population.rationale));
        }

        if !rct_meets {
            reasons.push(format!("RCT requirements: {}", rules.rct_details()));
        }

        if !pharma_meets {
            reasons.push(format!(
                "Pharmacological requirements: {}",
                rules.pharmacological.details
            ));
        }

        if rules.has_device_terms() && !pharma_meets {
            reasons.push(
                "Medical device study: Device indicators found without clear pharmacological intervention"
                    .to_string(),
            );
        }

        if rules.criteria_exclusion.is_decisive() {
            reasons.push(format!(
                "Screening criteria: {}",
                rules.criteria_exclusion.first_reasons(2)
            ));
        }

        reasons
    }

    fn require_all(&self, signals: &AxisSignals, rules: &RuleFindings) -> ScreeningResult {
        let design = signals.design.label;
        let population = signals.population.label;
        let intervention = signals.intervention.label;
        let mut requirements = Vec::with_capacity(3);

        if design == DesignType::Rct || rules.rct_requirement() {
            requirements.push(format!("Clinical trial design: {}", rules.rct_details()));
        } else {
            return ScreeningResult::exclude(
                0.90,
                format!("Not a clear clinical trial: {}", rules.rct_details()),
            );
        }

        if population == PopulationType::MiPatients || rules.mi_gate.passed() {
            requirements.push(format!("MI/acute coronary patients: {}", rules.mi_gate.details));
        } else {
            return ScreeningResult::exclude(
                0.90,
                format!("Not clear MI/acute coronary patients: {}", rules.mi_gate.details),
            );
        }

        let pharma_details = &rules.pharmacological.details;
        if rules.has_device_terms() {
            return ScreeningResult::exclude(
                0.90,
                format!(
                    "Medical device study excluded: {} (device terms: {})",
                    pharma_details,
                    rules.device_terms.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
                ),
            );
        }
        match intervention {
            InterventionType::Pharmacological => {
                requirements.push(format!("Pharmacological intervention: {}", pharma_details));
            }
            InterventionType::Combined if rules.has_drug_component() => {
                requirements.push(format!(
                    "Combined intervention studying drug component: {}",
                    pharma_details
                ));
            }
            _ => {
                return ScreeningResult::exclude(
                    0.90,
                    format!("Not clear pharmacological intervention: {}", pharma_details),
                );
            }
        }

        let per_criterion = |clean: bool| if clean { 0.90 } else { 0.80 };
        let average = (per_criterion(design == DesignType::Rct)
            + per_criterion(population == PopulationType::MiPatients)
            + per_criterion(intervention == InterventionType::Pharmacological))
            / 3.0;

        // Tolerate float error at the floor: three 0.80s average to 0.8000000000000002
        if average + 1e-9 >= INCLUSION_CONFIDENCE_FLOOR {
            ScreeningResult::include(
                average,
                format!(
                    "INCLUDED: {}. Overall assessment: {}",
                    requirements.join("; "),
                    rules.overall_assessment()
                ),
            )
        } else {
            ScreeningResult::exclude(
                0.80,
                format!(
                    "Confidence too low ({:.2}) despite meeting criteria: {}",
                    average,
                    requirements.join("; ")
                ),
            )
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// `"EXCLUDED: primary"` or `"EXCLUDED: primary. Additional issues: a; b"`.
fn format_exclusion(reasons: &[String]) -> String {
    match reasons {
        [] => "EXCLUDED".to_string(),
        [primary] => format!("EXCLUDED: {}", primary),
        [primary, rest @ ..] => format!(
            "EXCLUDED: {}. Additional issues: {}",
            primary,
            rest.iter().take(2).cloned().collect::<Vec<_>>().join("; ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::extract_all;
    use crate::types::{Decision, Verification};

    fn run(text: &str) -> ScreeningResult {
        let text = text.to_lowercase();
        let signals = extract_all(&text);
        let rules = RuleFindings::evaluate(&text, Verification::Unknown);
        Aggregator::new().aggregate(&signals, &rules)
    }

    #[test]
    fn test_title_checks() {
        let aggregator = Aggregator::new();
        let empty = aggregator.check_title("   ").unwrap();
        assert_eq!(empty.decision, Decision::Exclude);
        assert_eq!(empty.confidence, 0.95);

        let short = aggregator.check_title("MI trial").unwrap();
        assert_eq!(short.confidence, 0.90);
        assert!(short.reasoning.contains("8 chars"));

        assert!(aggregator.check_title("Atorvastatin after MI").is_none());
    }

    #[test]
    fn test_gate_failure() {
        let result = run("Statins for primary prevention in patients with MI");
        assert_eq!(result.decision, Decision::Exclude);
        assert_eq!(result.confidence, 0.95);
        assert!(result.reasoning.starts_with("CRITICAL EXCLUSION"));
    }

    #[test]
    fn test_clean_inclusion() {
        let result = run(
            "A randomized controlled trial of atorvastatin 80mg versus placebo \
             in patients with acute MI and acute coronary syndromes",
        );
        assert_eq!(result.decision, Decision::Include);
        assert!((result.confidence - 0.90).abs() < 1e-9);
        assert!(result.reasoning.starts_with("INCLUDED: Clinical trial design"));
        assert!(result.reasoning.contains("Overall assessment: Meets all three criteria"));
    }

    #[test]
    fn test_exclusion_reasons_accumulate() {
        let result = run("Case report: patients with acute MI");
        assert_eq!(result.decision, Decision::Exclude);
        assert!(result.reasoning.starts_with("EXCLUDED: Study design"));
        assert!(result.reasoning.contains("Additional issues"));
        assert!(result.confidence >= 0.90);
    }

    #[test]
    fn test_device_terms_exclude() {
        let result = run(
            "A randomized controlled trial of ticagrelor and clopidogrel after stent \
             implantation in patients with acute MI and STEMI",
        );
        assert_eq!(result.decision, Decision::Exclude);
        assert_eq!(result.confidence, 0.90);
        assert!(result.reasoning.starts_with("Medical device study excluded"));
    }

    #[test]
    fn test_possible_pharmacological_is_not_enough() {
        let result = run("A randomized controlled trial of aspirin in patients with acute MI and STEMI");
        assert_eq!(result.decision, Decision::Exclude);
        assert!(result.reasoning.starts_with("Not clear pharmacological intervention"));
    }

    #[test]
    fn test_exclusion_confidence_is_monotone_and_capped() {
        let mut previous = 0.0;
        for n in 1..10 {
            let c = exclusion_confidence(n);
            assert!(c >= previous);
            assert!(c <= 0.95);
            previous = c;
        }
        assert_eq!(exclusion_confidence(3), 0.95);
    }

    #[test]
    fn test_criteria_exclusion_is_a_reason() {
        let text = "a randomized controlled trial of atorvastatin 80mg versus placebo \
                    in patients with acute mi and acute coronary syndromes";
        let criteria = crate::criteria::Criteria {
            exclude_keywords: vec!["placebo".into()],
            study_types_exclude: vec!["acute coronary syndromes".into()],
            ..Default::default()
        }
        .compile()
        .unwrap();
        let signals = extract_all(text);
        let rules = RuleFindings::evaluate(text, Verification::Unknown).with_criteria(text, &criteria);

        let result = Aggregator::new().aggregate(&signals, &rules);
        assert_eq!(result.decision, Decision::Exclude);
        assert_eq!(result.confidence, exclusion_confidence(1));
        assert_eq!(
            result.reasoning,
            "EXCLUDED: Screening criteria: Contains excluded keyword: placebo; \
             Excluded study type: acute coronary syndromes"
        );
    }

    #[test]
    fn test_format_exclusion() {
        let reasons: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_exclusion(&reasons[..1]), "EXCLUDED: a");
        assert_eq!(format_exclusion(&reasons), "EXCLUDED: a. Additional issues: b; c");
    }
}
