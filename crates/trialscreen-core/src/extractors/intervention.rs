//! Intervention Extractor
//!
//! **Question**: Is the intervention under study pharmacological?
//!
//! ## Label Conditions
//!
//! | Label | Condition | Confidence |
//! |-------|-----------|------------|
//! | `health_system` | ≥1 health-system/technology term | 0.90 |
//! | `adherence_behavioral` | ≥1 adherence/behavioral term | 0.85 |
//! | `observational_pharma` | ≥1 registry term and ≥1 drug term | 0.85 |
//! | `pharmacological` | ≥2 drug terms, no procedural term | 0.90 |
//! | `combined` | ≥1 drug term and ≥1 procedural term | 0.75 |
//! | `non_pharmacological` | procedural terms only | 0.80 |
//! | `possible_pharmacological` | a single drug term | 0.70 |
//! | `unclear` | otherwise | 0.50 |

use lazy_static::lazy_static;

use crate::types::{Axis, AxisSignal, InterventionType};

use super::patterns::{join_first, PatternSet};
use super::{evidence_for, SignalExtractor};

lazy_static! {
    static ref PHARMACOLOGICAL: PatternSet = PatternSet::phrases(&[
        "drug", "drugs", "medication", "medications", "pharmaceutical",
        "therapy", "treatment", "beta blocker", "beta blockers",
        "ace inhibitor", "ace inhibitors", "antiplatelet", "aspirin",
        "clopidogrel", "atorvastatin", "metoprolol", "captopril", "heparin",
        "placebo",
    ])
    .with_regexes(&[
        ("statin", r"\bstatins?\b"),
        ("mg", r"\d\s*mg\b|\bmg\b"),
    ]);

    static ref NON_PHARMACOLOGICAL: PatternSet = PatternSet::phrases(&[
        "surgery", "surgical", "pci", "percutaneous coronary intervention",
        "stent", "stents", "stenting", "bypass", "angioplasty", "device",
        "pacemaker", "exercise", "rehabilitation", "lifestyle", "diet",
        "behavioral",
    ]);

    static ref HEALTH_SYSTEM: PatternSet = PatternSet::phrases(&[
        "electronic health record", "electronic health records", "ehr",
        "health records", "hospital system", "implementation",
        "quality improvement", "care coordination",
    ]);

    static ref ADHERENCE: PatternSet = PatternSet::phrases(&[
        "medication adherence", "adherence program", "adherence intervention",
        "medication compliance", "medication support", "pill counting",
        "adherence monitoring", "medication management", "adherence counseling",
    ]);

    static ref REGISTRY: PatternSet = PatternSet::phrases(&[
        "registry", "database", "observational", "retrospective analysis",
        "administrative data", "claims data", "surveillance",
    ]);
}

/// Classifies intervention type.
pub struct InterventionExtractor;

impl InterventionExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InterventionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalExtractor for InterventionExtractor {
    type Label = InterventionType;

    fn axis(&self) -> Axis {
        Axis::Intervention
    }

    fn question(&self) -> &'static str {
        "Is the intervention under study pharmacological?"
    }

    fn extract(&self, text: &str) -> AxisSignal<InterventionType> {
        let pharma = PHARMACOLOGICAL.matches(text);
        let non_pharma = NON_PHARMACOLOGICAL.matches(text);
        let health_system = HEALTH_SYSTEM.matches(text);
        let adherence = ADHERENCE.matches(text);
        let registry = REGISTRY.matches(text);

        let names = |m: &[super::PatternMatch]| {
            join_first(&m.iter().map(|p| p.label.clone()).collect::<Vec<_>>(), 3)
        };

        let signal = if !health_system.is_empty() {
            AxisSignal::new(
                InterventionType::HealthSystem,
                0.90,
                format!("Health system/technology intervention ({})", names(&health_system)),
            )
            .with_evidence(evidence_for(&health_system, "health-system term"))
        } else if !adherence.is_empty() {
            AxisSignal::new(
                InterventionType::AdherenceBehavioral,
                0.85,
                format!(
                    "Medication adherence/behavioral intervention, not direct pharmacological ({})",
                    names(&adherence)
                ),
            )
            .with_evidence(evidence_for(&adherence, "adherence term"))
        } else if !registry.is_empty() && !pharma.is_empty() {
            AxisSignal::new(
                InterventionType::ObservationalPharma,
                0.85,
                format!(
                    "Observational study of pharmacological treatments ({})",
                    names(&registry)
                ),
            )
            .with_evidence(evidence_for(&registry, "registry term"))
        } else if pharma.len() >= 2 && non_pharma.is_empty() {
            AxisSignal::new(
                InterventionType::Pharmacological,
                0.90,
                format!("Clear pharmacological intervention ({})", names(&pharma)),
            )
            .with_evidence(evidence_for(&pharma, "drug term"))
        } else if !pharma.is_empty() && !non_pharma.is_empty() {
            AxisSignal::new(
                InterventionType::Combined,
                0.75,
                format!(
                    "Combined pharmacological ({}) and procedural ({}) intervention",
                    names(&pharma),
                    names(&non_pharma)
                ),
            )
            .with_evidence(evidence_for(&pharma, "drug term"))
        } else if !non_pharma.is_empty() {
            AxisSignal::new(
                InterventionType::NonPharmacological,
                0.80,
                format!("Non-pharmacological intervention ({})", names(&non_pharma)),
            )
            .with_evidence(evidence_for(&non_pharma, "procedural term"))
        } else if !pharma.is_empty() {
            AxisSignal::new(
                InterventionType::PossiblePharmacological,
                0.70,
                format!("Possible pharmacological intervention ({})", names(&pharma)),
            )
            .with_evidence(evidence_for(&pharma, "drug term"))
        } else {
            AxisSignal::new(InterventionType::Unclear, 0.50, "Intervention type unclear")
        };

        signal
            .with_count("pharmacological", pharma.len())
            .with_count("non_pharmacological", non_pharma.len())
            .with_count("health_system", health_system.len())
            .with_count("adherence", adherence.len())
            .with_count("registry", registry.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> AxisSignal<InterventionType> {
        InterventionExtractor::new().extract(&text.to_lowercase())
    }

    #[test]
    fn test_health_system_wins() {
        let signal = extract("An EHR alert to increase statin prescribing");
        assert_eq!(signal.label, InterventionType::HealthSystem);
        assert_eq!(signal.confidence, 0.90);
    }

    #[test]
    fn test_adherence() {
        let signal = extract("A medication adherence program after discharge with aspirin");
        assert_eq!(signal.label, InterventionType::AdherenceBehavioral);
    }

    #[test]
    fn test_registry_with_drug_is_observational() {
        let signal = extract("Clopidogrel use in a national registry");
        assert_eq!(signal.label, InterventionType::ObservationalPharma);
        assert_eq!(signal.confidence, 0.85);
    }

    #[test]
    fn test_pharmacological() {
        let signal = extract("Atorvastatin 80mg daily or matching placebo");
        assert_eq!(signal.label, InterventionType::Pharmacological);
        assert_eq!(signal.confidence, 0.90);
        assert!(signal.count("pharmacological") >= 3);
    }

    #[test]
    fn test_combined() {
        let signal = extract("Heparin during primary PCI");
        assert_eq!(signal.label, InterventionType::Combined);
        assert_eq!(signal.confidence, 0.75);
    }

    #[test]
    fn test_non_pharmacological() {
        let signal = extract("Drug-eluting stent versus bare-metal stent");
        // "drug" alone plus "stent" is combined, not procedural-only
        assert_eq!(signal.label, InterventionType::Combined);

        let signal = extract("Cardiac rehabilitation with supervised exercise");
        assert_eq!(signal.label, InterventionType::NonPharmacological);
        assert_eq!(signal.confidence, 0.80);
    }

    #[test]
    fn test_possible_pharmacological() {
        let signal = extract("Aspirin timing in chest pain");
        assert_eq!(signal.label, InterventionType::PossiblePharmacological);
        assert_eq!(signal.confidence, 0.70);
    }

    #[test]
    fn test_unclear() {
        let signal = extract("Troponin kinetics in the emergency department");
        assert_eq!(signal.label, InterventionType::Unclear);
    }

    #[test]
    fn test_statin_inside_atorvastatin_is_not_double_counted() {
        let signal = extract("atorvastatin");
        assert_eq!(signal.count("pharmacological"), 1);
    }
}
