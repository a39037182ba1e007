//! Criteria-keyword screener.
//!
//! Scores the record against the loaded criteria lists, then requires all
//! three core criteria (RCT, STEMI/NSTEMI, MI pharmacological therapy).
//! Decides the record when the axis classifier fails or the stringent
//! result falls below the fallback floor. The exclusion score alone also
//! feeds the aggregator's exclusion reasons.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::criteria::CompiledCriteria;
use crate::extractors::PatternSet;
use crate::types::{ScreeningResult, Verification};

use super::rct_scorer;

lazy_static! {
    static ref STEMI_NSTEMI: PatternSet = PatternSet::phrases(&[
        "stemi", "st-elevation myocardial infarction", "st elevation myocardial infarction",
        "nstemi", "non-st-elevation myocardial infarction",
        "non st elevation myocardial infarction", "acute coronary syndrome", "acs",
        "myocardial infarction", "acute mi", "acute myocardial infarction", "heart attack",
    ]);

    static ref MI_CONTEXT: PatternSet = PatternSet::phrases(&[
        "myocardial infarction", "mi", "stemi", "nstemi",
        "st-elevation myocardial infarction", "non-st-elevation myocardial infarction",
        "acute myocardial infarction", "acute mi", "heart attack",
        "post-mi", "post-myocardial infarction", "after myocardial infarction",
        "following myocardial infarction", "post-acute myocardial infarction",
        "after acute myocardial infarction", "following mi", "after mi",
        "post myocardial infarction", "post-acute mi", "after acute mi",
        "during myocardial infarction", "acute mi treatment", "mi treatment",
        "mi therapy", "myocardial infarction therapy", "acute mi management",
    ]);

    static ref PHARMA_TERMS: PatternSet = PatternSet::phrases(&[
        "medication", "drug", "pharmaceutical", "therapy", "treatment",
        "antiplatelet", "statin", "ace inhibitor", "arb", "beta blocker",
        "aspirin", "clopidogrel", "atorvastatin", "metoprolol", "lisinopril",
        "oral", "tablet", "capsule", "dose", "dosage", "mg", "milligram",
        "pharmacological", "medical therapy", "drug therapy",
        "antithrombotic", "anticoagulant", "lipid-lowering", "antihypertensive",
    ])
    .with_regexes(&[("mg dose", r"\d\s*mg\b")]);

    static ref PROCEDURES: PatternSet = PatternSet::phrases(&[
        "surgery", "surgical", "percutaneous coronary intervention", "pci",
        "coronary artery bypass", "cabg", "angioplasty", "stent", "stenting",
        "revascularization", "device", "pacemaker", "defibrillator", "icd",
        "exercise training", "cardiac rehabilitation program", "lifestyle modification",
        "diet therapy", "dietary intervention", "nutrition", "weight loss",
        "smoking cessation", "behavioral intervention", "counseling",
        "education program", "physical therapy", "rehabilitation",
    ]);

    static ref PREVENTION: PatternSet = PatternSet::phrases(&[
        "primary prevention", "secondary prevention", "prevention study",
        "preventive therapy", "preventive treatment", "prevention trial",
        "prophylactic", "prophylaxis", "prevent", "preventing",
        "risk reduction", "cardiovascular prevention", "cardiac prevention",
    ]);

    static ref REGISTRY: PatternSet = PatternSet::phrases(&[
        "registry study", "database analysis", "registry data", "registry analysis",
        "national cardiovascular data registry", "hospital registry",
        "administrative database", "claims database", "electronic health record",
        "ehr", "health records analysis", "survey data", "observational study",
        "retrospective study", "cohort study",
    ]);
}

/// Scores above this exclude on the criteria lists alone.
pub const EXCLUSION_SCORE_THRESHOLD: u32 = 2;

/// Exclusion score from the criteria lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionScore {
    pub score: u32,
    pub reasons: Vec<String>,
}

impl ExclusionScore {
    pub fn is_decisive(&self) -> bool {
        self.score > EXCLUSION_SCORE_THRESHOLD
    }

    /// The first `n` reasons joined with "; ".
    pub fn first_reasons(&self, n: usize) -> String {
        self.reasons.iter().take(n).cloned().collect::<Vec<_>>().join("; ")
    }
}

/// Score 1 per matched `exclude_keywords` entry and 2 per matched
/// `study_types_exclude` entry.
pub fn exclusion_score(text: &str, criteria: &CompiledCriteria) -> ExclusionScore {
    let mut result = ExclusionScore::default();

    for keyword in criteria.excluded_keywords(text) {
        result.score += 1;
        result.reasons.push(format!("Contains excluded keyword: {}", keyword));
    }
    for study_type in criteria.excluded_study_types(text) {
        result.score += 2;
        result.reasons.push(format!("Excluded study type: {}", study_type));
    }

    result
}

/// MI context, pharmacological terms, no prevention phrasing and no
/// registry design. Procedures are allowed only with drug-component evidence.
pub fn has_mi_pharmacological_therapy(text: &str) -> bool {
    if REGISTRY.is_match(text) {
        return false;
    }

    if !(MI_CONTEXT.is_match(text) && PHARMA_TERMS.is_match(text) && !PREVENTION.is_match(text)) {
        return false;
    }

    !PROCEDURES.is_match(text) || !super::requirements::drug_component(text).is_empty()
}

/// The three required criteria, in reporting order.
pub fn required_criteria(text: &str, verification: Verification) -> [(&'static str, bool); 3] {
    let rct = verification
        .as_option()
        .unwrap_or_else(|| rct_scorer::score(text).is_rct());

    [
        ("RCT", rct),
        ("STEMI/NSTEMI", STEMI_NSTEMI.is_match(text)),
        ("MI Pharmacological Therapy", has_mi_pharmacological_therapy(text)),
    ]
}

/// Screen lower-cased text against the criteria lists.
pub fn screen(
    text: &str,
    criteria: &CompiledCriteria,
    verification: Verification,
) -> ScreeningResult {
    let exclusion = exclusion_score(text, criteria);

    if exclusion.is_decisive() {
        let confidence = (0.80 + 0.03 * exclusion.score as f64).min(0.95);
        return ScreeningResult::exclude(confidence, exclusion.first_reasons(2));
    }

    let required = required_criteria(text, verification);
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, met)| !met)
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return ScreeningResult::exclude(
            0.85,
            format!("Missing required criteria: {}", missing.join(", ")),
        );
    }

    if exclusion.score <= 1 {
        let met: Vec<&str> = required.iter().map(|(name, _)| *name).collect();
        let mut reasoning = format!("All required criteria met: {}", met.join(", "));
        let included = criteria.included_keywords(text);
        if !included.is_empty() {
            reasoning.push_str(&format!("; include keywords: {}", included.join(", ")));
        }
        return ScreeningResult::include(0.90, reasoning);
    }

    ScreeningResult::maybe(
        0.60,
        format!(
            "All criteria met but exclusion concerns: {}",
            exclusion.first_reasons(2)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::Criteria;
    use crate::types::Decision;

    const RCT_TEXT: &str = "we conducted a randomized, placebo-controlled trial in patients \
                            with stemi. atorvastatin 80 mg was compared with placebo; \
                            the primary endpoint was mortality.";

    fn criteria(exclude: &[&str], study_types: &[&str]) -> CompiledCriteria {
        Criteria {
            exclude_keywords: exclude.iter().map(|s| s.to_string()).collect(),
            study_types_exclude: study_types.iter().map(|s| s.to_string()).collect(),
            include_keywords: vec!["placebo".into()],
            ..Default::default()
        }
        .compile()
        .unwrap()
    }

    #[test]
    fn test_all_criteria_met_includes() {
        let result = screen(RCT_TEXT, &criteria(&[], &[]), Verification::Unknown);
        assert_eq!(result.decision, Decision::Include);
        assert_eq!(result.confidence, 0.90);
        assert!(result.reasoning.contains("RCT, STEMI/NSTEMI, MI Pharmacological Therapy"));
        assert!(result.reasoning.contains("include keywords: placebo"));
    }

    #[test]
    fn test_high_exclusion_score() {
        let text = "a pediatric case report";
        let result = screen(text, &criteria(&["pediatric"], &["case report"]), Verification::Unknown);
        assert_eq!(result.decision, Decision::Exclude);
        // min(0.95, 0.80 + 0.03 * 3)
        assert!((result.confidence - 0.89).abs() < 1e-9);
        assert_eq!(
            result.reasoning,
            "Contains excluded keyword: pediatric; Excluded study type: case report"
        );
    }

    #[test]
    fn test_exclusion_confidence_is_capped() {
        let text = "alpha beta gamma delta epsilon zeta";
        let words = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];
        let result = screen(text, &criteria(&words, &[]), Verification::Unknown);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_missing_criteria() {
        let result = screen("a study of aspirin", &criteria(&[], &[]), Verification::Unknown);
        assert_eq!(result.decision, Decision::Exclude);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(
            result.reasoning,
            "Missing required criteria: RCT, STEMI/NSTEMI, MI Pharmacological Therapy"
        );
    }

    #[test]
    fn test_exclusion_concerns_give_maybe() {
        let result = screen(RCT_TEXT, &criteria(&[], &["mortality"]), Verification::Unknown);
        assert_eq!(result.decision, Decision::Maybe);
        assert_eq!(result.confidence, 0.60);
        assert!(result.reasoning.contains("Excluded study type: mortality"));
    }

    #[test]
    fn test_verification_overrides_scorer() {
        let result = screen(RCT_TEXT, &criteria(&[], &[]), Verification::ConfirmedNonRct);
        assert_eq!(result.decision, Decision::Exclude);
        assert_eq!(result.reasoning, "Missing required criteria: RCT");
    }

    #[test]
    fn test_registry_and_prevention_block_therapy() {
        assert!(!has_mi_pharmacological_therapy("a registry analysis of aspirin after mi"));
        assert!(!has_mi_pharmacological_therapy("aspirin to prevent recurrent mi"));
    }

    #[test]
    fn test_procedures_need_drug_component() {
        assert!(!has_mi_pharmacological_therapy("stenting and aspirin in mi"));
        assert!(has_mi_pharmacological_therapy(
            "adjunctive therapy with abciximab during pci in acute mi"
        ));
    }
}
