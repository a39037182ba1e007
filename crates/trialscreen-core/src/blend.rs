//! Blending of a remote-LLM result with the rule-based result.
//!
//! Used in blended mode only. The semantic (LLM) result is primary; the
//! rule-based result takes over only when it is very confident and the
//! semantic one is not.

use crate::types::{Decision, ScreeningResult};

/// Combine a semantic and a rule-based result. First matching rule wins:
///
/// 1. semantic confidence ≥ 0.75 → semantic
/// 2. same decision and both confidences > 0.6 → weighted 0.7 / 0.3
/// 3. rule-based ≥ 0.85 and semantic < 0.6 → rule-based
/// 4. semantic EXCLUDE against rule-based INCLUDE → semantic
/// 5. otherwise → semantic
pub fn blend(semantic: &ScreeningResult, rules: &ScreeningResult) -> ScreeningResult {
    if semantic.confidence >= 0.75 {
        return ScreeningResult::new(
            semantic.decision,
            semantic.confidence,
            format!("Semantic analysis: {}", semantic.reasoning),
        );
    }

    if semantic.decision == rules.decision && semantic.confidence.min(rules.confidence) > 0.6 {
        return ScreeningResult::new(
            semantic.decision,
            semantic.confidence * 0.7 + rules.confidence * 0.3,
            format!("Semantic + criteria agreement: {}", semantic.reasoning),
        );
    }

    if rules.confidence >= 0.85 && semantic.confidence < 0.6 {
        return ScreeningResult::new(
            rules.decision,
            rules.confidence,
            format!("High confidence criteria: {}", rules.reasoning),
        );
    }

    if semantic.decision == Decision::Exclude && rules.decision == Decision::Include {
        return ScreeningResult::new(
            semantic.decision,
            semantic.confidence,
            format!("Semantic exclusion: {}", semantic.reasoning),
        );
    }

    ScreeningResult::new(
        semantic.decision,
        semantic.confidence,
        format!("Semantic analysis (primary): {}", semantic.reasoning),
    )
}
