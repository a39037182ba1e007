//! Permissive requirement checks used by the aggregator.

use lazy_static::lazy_static;

use crate::extractors::patterns::join_first;
use crate::extractors::PatternSet;

use super::RuleCheck;

lazy_static! {
    static ref TRIAL_STRONG: PatternSet = PatternSet::phrases(&[
        "randomized controlled trial", "randomised controlled trial",
        "double-blind randomized", "placebo-controlled randomized",
        "randomly assigned patients", "treatment group", "control group",
        "clinical trial", "prospective trial", "controlled trial",
    ]);

    static ref TRIAL_COMPARISON: PatternSet = PatternSet::phrases(&[
        "versus", "vs", "compared with", "compared to", "compared against",
        "compared", "combination", "combined with", "plus", "alone",
        "monotherapy", "versus placebo", "vs placebo", "compared to placebo",
    ]);

    static ref TRIAL_DESIGN: PatternSet = PatternSet::phrases(&[
        "randomized", "randomised", "randomly assigned", "random allocation",
        "prospective", "multicenter", "multicentre", "phase", "trial", "study",
        "examination", "investigation", "evaluation", "assessment",
    ]);

    static ref TRIAL_PATIENTS: PatternSet = PatternSet::phrases(&[
        "patients", "participants", "subjects", "outcomes", "endpoints",
        "efficacy", "safety", "effects", "results", "response",
    ]);

    static ref PHARMA_STRONG: PatternSet = PatternSet::phrases(&[
        "medication", "drug", "pharmaceutical", "therapy", "treatment",
        "antiplatelet", "statin", "ace inhibitor", "beta blocker", "aspirin",
        "clopidogrel", "atorvastatin", "metoprolol", "ezetimibe", "simvastatin",
        "dose", "dosage", "pharmacological",
    ])
    .with_regexes(&[("mg", r"\d\s*mg\b|\bmg\b")]);

    static ref PHARMA_MEDIUM: PatternSet = PatternSet::phrases(&[
        "combined with", "plus", "versus", "vs", "compared with", "suppression",
        "enhanced", "results in", "greater", "oral", "tablet", "capsule", "milligram",
    ]);

    static ref DEVICE_TERMS: PatternSet = PatternSet::phrases(&[
        "device", "stent", "catheter", "implant", "pacemaker", "defibrillator",
        "surgical", "surgery", "procedure", "intervention", "pci", "angioplasty",
        "bypass", "graft", "mechanical", "implantable", "prosthetic",
    ]);

    static ref DRUG_COMPONENT: PatternSet = PatternSet::phrases(&[
        "randomized to receive", "drug vs", "medication vs", "therapy vs",
        "compared to placebo", "versus placebo", "drug therapy",
        "pharmacological intervention", "medical therapy", "drug treatment",
        "medication therapy", "therapeutic intervention", "drug regimen",
        "dosage", "dose", "mg", "milligram", "administration", "drug efficacy",
        "medication efficacy", "therapeutic efficacy", "drug safety",
        "medication safety", "adverse drug", "side effects", "adjunctive therapy",
        "adjunctive medication", "adjunctive drug", "concomitant therapy",
        "concomitant medication", "add-on therapy",
    ])
    .with_regexes(&[("mg dose", r"\d\s*mg\b")]);
}

/// Permissive clinical-trial gate.
///
/// Passes under any of the threshold combinations over the four counts
/// (strong trial phrases, comparators, design terms, patient/outcome terms).
pub fn rct_gate(text: &str) -> RuleCheck {
    let strong = TRIAL_STRONG.labels(text);
    let comparison = TRIAL_COMPARISON.labels(text);
    let design = TRIAL_DESIGN.labels(text);
    let patients = TRIAL_PATIENTS.labels(text);

    let (s, c, d, p) = (strong.len(), comparison.len(), design.len(), patients.len());
    let passed = s >= 1
        || (c >= 2 && d >= 1 && p >= 2)
        || (c >= 1 && d >= 2 && p >= 2)
        || (c >= 2 && p >= 3)
        || (c >= 2 && d >= 1)
        || (d >= 2 && p >= 2)
        || (d >= 1 && p >= 1)
        || p >= 2
        || d >= 1;

    let details = if passed && s >= 1 {
        format!("Strong clinical trial indicators: {}", join_first(&strong, 3))
    } else if passed {
        format!(
            "Drug comparison study: {} with {} design in {}",
            join_first(&comparison, 2),
            join_first(&design, 2),
            join_first(&patients, 2)
        )
    } else {
        format!(
            "Insufficient clinical trial indicators. Found: strong {}, comparison {}, design {}, patients {}",
            s, c, d, p
        )
    };

    tracing::trace!(rule = "rct_gate", passed, s, c, d, p);

    RuleCheck::new(passed, details)
        .with_count("strong", s)
        .with_count("comparison", c)
        .with_count("design", d)
        .with_count("patients", p)
}

/// Pharmacological requirement: at least one strong drug term.
///
/// Medium terms never decide; they are reported in the details only.
pub fn pharmacological(text: &str) -> RuleCheck {
    let strong = PHARMA_STRONG.labels(text);
    let medium = PHARMA_MEDIUM.labels(text);
    let passed = !strong.is_empty();

    let details = if passed {
        if medium.is_empty() {
            format!("Strong pharmacological indicators: {}", join_first(&strong, 3))
        } else {
            format!(
                "Strong pharmacological indicators: {} (supporting: {})",
                join_first(&strong, 3),
                join_first(&medium, 2)
            )
        }
    } else {
        format!(
            "Insufficient pharmacological indicators. Found: strong 0, medium {}",
            medium.len()
        )
    };

    RuleCheck::new(passed, details)
        .with_count("strong", strong.len())
        .with_count("medium", medium.len())
}

/// Device and procedural terms present in the text.
pub fn device_terms(text: &str) -> Vec<String> {
    DEVICE_TERMS.labels(text)
}

/// Phrases showing that a combined procedure-plus-drug study evaluates the drug.
pub fn drug_component(text: &str) -> Vec<String> {
    DRUG_COMPONENT.labels(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_trial_phrase_passes() {
        let check = rct_gate("a randomized controlled trial");
        assert!(check.passed);
        assert!(check.details.starts_with("Strong clinical trial indicators"));
    }

    #[test]
    fn test_single_design_term_passes() {
        let check = rct_gate("an evaluation");
        assert!(check.passed);
        assert_eq!(check.count("design"), 1);
        assert!(check.details.starts_with("Drug comparison study"));
    }

    #[test]
    fn test_two_patient_terms_pass() {
        assert!(rct_gate("patients and outcomes").passed);
    }

    #[test]
    fn test_gate_fails_without_indicators() {
        let check = rct_gate("case report: takotsubo cardiomyopathy");
        assert!(!check.passed);
        assert!(check.details.starts_with("Insufficient clinical trial indicators"));
    }

    #[test]
    fn test_pharmacological_needs_strong_term() {
        assert!(pharmacological("atorvastatin 80mg daily").passed);
        let check = pharmacological("oral tablet versus capsule");
        assert!(!check.passed);
        assert_eq!(check.count("medium"), 4);
    }

    #[test]
    fn test_pharmacological_reports_medium_terms() {
        let check = pharmacological("aspirin combined with heparin");
        assert!(check.passed);
        assert!(check.details.contains("supporting: combined with"));
    }

    #[test]
    fn test_device_terms() {
        assert_eq!(device_terms("stent implantation after pci"), vec!["stent", "pci"]);
        assert!(device_terms("atorvastatin in acute mi").is_empty());
    }

    #[test]
    fn test_drug_component() {
        assert!(!drug_component("adjunctive therapy with abciximab").is_empty());
        assert!(!drug_component("a 600 mg loading dose").is_empty());
        assert!(drug_component("stenting with bare-metal stents").is_empty());
    }
}
