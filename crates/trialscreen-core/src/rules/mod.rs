//! Rule-based screening engine.
//!
//! Keyword and regex checks that run alongside the axis extractors:
//!
//! - [`mi_gate`]: the stringent MI-population gate, evaluated first
//! - [`requirements`]: the permissive RCT gate, the pharmacological
//!   requirement, device terms and drug-component evidence
//! - [`rct_scorer`]: the additive full-text RCT scorer
//! - [`criteria_screen`]: the criteria-keyword screener and exclusion score
//! - [`drug_mi`]: the drug-name + MI pattern annotation

pub mod criteria_screen;
pub mod drug_mi;
pub mod mi_gate;
pub mod rct_scorer;
pub mod requirements;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::criteria::CompiledCriteria;
use crate::types::Verification;

pub use criteria_screen::ExclusionScore;
pub use mi_gate::{GateVerdict, MiGateFinding};
pub use rct_scorer::{RctScore, RCT_THRESHOLD};

/// Outcome of one boolean requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub passed: bool,
    pub details: String,
    #[serde(default)]
    pub counts: BTreeMap<String, usize>,
}

impl RuleCheck {
    pub fn new(passed: bool, details: impl Into<String>) -> Self {
        Self {
            passed,
            details: details.into(),
            counts: BTreeMap::new(),
        }
    }

    pub fn with_count(mut self, category: impl Into<String>, count: usize) -> Self {
        self.counts.insert(category.into(), count);
        self
    }

    pub fn count(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }
}

/// Every rule finding the aggregator consults for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFindings {
    pub mi_gate: MiGateFinding,
    pub rct_gate: RuleCheck,
    pub pharmacological: RuleCheck,
    pub device_terms: Vec<String>,
    pub drug_component: Vec<String>,
    pub verification: Verification,
    /// Score against the loaded criteria lists; zero until
    /// [`with_criteria`](Self::with_criteria) runs.
    #[serde(default)]
    pub criteria_exclusion: ExclusionScore,
}

impl RuleFindings {
    /// Evaluate all rules over lower-cased screening text.
    pub fn evaluate(text: &str, verification: Verification) -> Self {
        Self {
            mi_gate: mi_gate::evaluate(text),
            rct_gate: requirements::rct_gate(text),
            pharmacological: requirements::pharmacological(text),
            device_terms: requirements::device_terms(text),
            drug_component: requirements::drug_component(text),
            verification,
            criteria_exclusion: ExclusionScore::default(),
        }
    }

    /// Score the same text against the loaded criteria lists.
    pub fn with_criteria(mut self, text: &str, criteria: &CompiledCriteria) -> Self {
        self.criteria_exclusion = criteria_screen::exclusion_score(text, criteria);
        self
    }

    /// The RCT requirement: a known document verification overrides the
    /// permissive gate.
    pub fn rct_requirement(&self) -> bool {
        self.verification
            .as_option()
            .unwrap_or(self.rct_gate.passed)
    }

    pub fn rct_details(&self) -> String {
        match self.verification {
            Verification::ConfirmedRct => "Full-text verification confirmed an RCT".to_string(),
            Verification::ConfirmedNonRct => {
                "Full-text verification found no RCT design".to_string()
            }
            Verification::Unknown => self.rct_gate.details.clone(),
        }
    }

    pub fn has_device_terms(&self) -> bool {
        !self.device_terms.is_empty()
    }

    pub fn has_drug_component(&self) -> bool {
        !self.drug_component.is_empty()
    }

    /// Plain-language count of how many of the three core criteria hold.
    pub fn overall_assessment(&self) -> String {
        let strong = self.pharmacological.count("strong");
        let medium = self.pharmacological.count("medium");
        let met = [
            self.rct_requirement(),
            self.mi_gate.passed(),
            strong >= 2 || (strong >= 1 && medium >= 1),
        ]
        .iter()
        .filter(|met| **met)
        .count();

        match met {
            3 => "Meets all three criteria for inclusion",
            2 => "Meets 2/3 criteria - borderline case",
            1 => "Meets only 1/3 criteria - insufficient",
            _ => "Meets 0/3 criteria - clear exclusion",
        }
        .to_string()
    }
}
