//! Study Design Extractor
//!
//! **Question**: Is this a primary randomized controlled trial?
//!
//! ## Label Conditions
//!
//! First rule that holds wins.
//!
//! | Label | Condition | Confidence |
//! |-------|-----------|------------|
//! | `review` | ≥1 review marker | 0.95 |
//! | `non_rct` | ≥1 non-RCT study type | 0.85 |
//! | `rct` | ≥2 strong RCT markers, no non-RCT marker | 0.90 |
//! | `likely_rct` | ≥1 strong RCT marker, no non-RCT marker | 0.75 |
//! | `unclear_trial` | a generic trial/study term | 0.60 |
//! | `unclear` | otherwise | 0.50 |

use lazy_static::lazy_static;

use crate::types::{Axis, AxisSignal, DesignType};

use super::patterns::{join_first, PatternSet};
use super::{evidence_for, SignalExtractor};

lazy_static! {
    static ref REVIEW_MARKERS: PatternSet = PatternSet::phrases(&[
        "review", "meta-analysis", "systematic review", "comprehensive review",
        "literature review", "narrative review", "this review", "we review",
        "review examines", "review of", "synthesizes evidence", "summarizes evidence",
    ]);

    static ref NON_RCT_TYPES: PatternSet = PatternSet::phrases(&[
        "systematic review", "meta-analysis", "registry", "database analysis",
        "observational", "retrospective", "cohort study", "case-control",
        "cross-sectional", "survey", "case report", "case series",
        "comprehensive review", "narrative review", "literature review",
        "review article", "scoping review", "umbrella review",
        "this review", "we review", "review examines", "review of",
        "synthesizes evidence", "summarizes evidence", "evidence synthesis",
        "review and meta-analysis", "overview of", "current review",
        "review summarizes", "review discusses", "review provides",
    ]);

    static ref STRONG_RCT: PatternSet = PatternSet::phrases(&[
        "randomized", "randomised", "randomly assigned", "rct",
        "placebo-controlled", "double-blind", "controlled trial",
    ]);

    static ref GENERIC_TRIAL: PatternSet = PatternSet::phrases(&[
        "trial", "trials", "study", "studies",
    ]);
}

/// Classifies study design.
pub struct DesignExtractor;

impl DesignExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DesignExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalExtractor for DesignExtractor {
    type Label = DesignType;

    fn axis(&self) -> Axis {
        Axis::StudyDesign
    }

    fn question(&self) -> &'static str {
        "Is this a primary randomized controlled trial?"
    }

    fn extract(&self, text: &str) -> AxisSignal<DesignType> {
        let review = REVIEW_MARKERS.matches(text);
        let non_rct = NON_RCT_TYPES.matches(text);
        let strong = STRONG_RCT.matches(text);
        let generic = GENERIC_TRIAL.matches(text);

        let labels = |m: &[super::PatternMatch]| m.iter().map(|p| p.label.clone()).collect::<Vec<_>>();

        let signal = if !review.is_empty() {
            AxisSignal::new(
                DesignType::Review,
                0.95,
                format!(
                    "Review article detected, not a primary RCT ({})",
                    join_first(&labels(&review), 3)
                ),
            )
            .with_evidence(evidence_for(&review, "review marker"))
        } else if !non_rct.is_empty() {
            AxisSignal::new(
                DesignType::NonRct,
                0.85,
                format!(
                    "Non-RCT study type detected ({})",
                    join_first(&labels(&non_rct), 3)
                ),
            )
            .with_evidence(evidence_for(&non_rct, "non-RCT study type"))
        } else if strong.len() >= 2 {
            AxisSignal::new(
                DesignType::Rct,
                0.90,
                format!(
                    "Strong RCT indicators with no contradictory signals ({})",
                    join_first(&labels(&strong), 3)
                ),
            )
            .with_evidence(evidence_for(&strong, "strong RCT marker"))
        } else if strong.len() == 1 {
            AxisSignal::new(
                DesignType::LikelyRct,
                0.75,
                format!("RCT indicator present ({})", strong[0].label),
            )
            .with_evidence(evidence_for(&strong, "strong RCT marker"))
        } else if !generic.is_empty() {
            AxisSignal::new(
                DesignType::UnclearTrial,
                0.60,
                "Some trial indicators but design unclear",
            )
            .with_evidence(evidence_for(&generic, "generic trial term"))
        } else {
            AxisSignal::new(DesignType::Unclear, 0.50, "Study design unclear")
        };

        tracing::trace!(label = %signal.label, strong = strong.len(), non_rct = non_rct.len(), "design extracted");

        signal
            .with_count("review", review.len())
            .with_count("non_rct", non_rct.len())
            .with_count("strong_rct", strong.len())
            .with_count("generic_trial", generic.len())
    }
}
