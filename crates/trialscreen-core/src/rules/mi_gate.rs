//! Stringent MI-population gate.
//!
//! Evaluated before every other criterion. Prevention and risk-reduction
//! phrasing excludes outright, ahead of any inclusion phrase. Otherwise at
//! least one phrase placing current or previous MI patients in the study is
//! required.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;
use crate::extractors::patterns::join_first;
use crate::extractors::PatternSet;

/// Confidence of every gate exclusion.
pub const GATE_EXCLUSION_CONFIDENCE: f64 = 0.95;

lazy_static! {
    static ref PREVENTION: PatternSet = PatternSet::phrases(&[
        "prevention of mi", "prevent mi", "preventing mi", "prevent myocardial infarction",
        "risk of mi", "risk of myocardial infarction", "risk of heart attack",
        "reduce risk", "reducing risk", "risk reduction", "lower risk",
        "primary prevention", "secondary prevention", "preventive",
        "at risk of", "high risk", "risk factors", "cardiovascular risk",
        "future mi", "future myocardial infarction", "future heart attack",
        "incident mi", "incident myocardial infarction", "new mi", "new myocardial infarction",
        "first mi", "first myocardial infarction", "initial mi", "initial myocardial infarction",
        "prevent cardiovascular", "prevent cardiac", "prevent coronary",
        "without mi", "without myocardial infarction", "without heart attack",
        "no history of mi", "no history of myocardial infarction", "no history of heart attack",
        "healthy patients", "asymptomatic", "no symptoms", "no prior mi",
    ]);

    static ref INCLUSION: PatternSet = {
        let mut phrases: Vec<String> = Vec::new();
        for term in ["mi", "myocardial infarction", "heart attack"] {
            for template in [
                "current {} patients", "patients who have had {}", "patients with current {}",
                "patients with {}", "subjects with {}", "individuals with {}", "people with {}",
                "adults with {}", "patients after {}", "following {}", "after {}",
                "previous {}", "prior {}", "history of {}", "past {}", "recent {}",
                "patients who had {}", "patients with a history of {}", "subjects who had {}",
                "individuals who had {}", "{} survivors", "patients who survived {}",
                "subjects who survived {}", "{} cohort", "cohort of {} patients", "{} group",
                "{} patients treated", "acute {}", "acute {} patients", "patients with acute {}",
                "subjects with acute {}", "{} cases", "{} subjects", "{} participants",
                "{} volunteers",
            ] {
                phrases.push(template.replace("{}", term));
            }
        }
        for term in ["stemi", "nstemi"] {
            for template in [
                "previous {}", "prior {}", "history of {}", "past {}", "post-{}",
                "patients who had {}", "patients with previous {}", "subjects with {}",
                "individuals with {}", "{} patients", "patients with {}",
            ] {
                phrases.push(template.replace("{}", term));
            }
        }
        phrases.extend(
            [
                "post-mi", "post-myocardial infarction", "post-infarction",
                "post-acute mi", "post-acute myocardial infarction",
                "patients with acute coronary syndrome and mi", "patients with acs and mi",
                "acute coronary syndrome with mi", "acs with mi",
                "post-mi patients treated", "previous mi patients treated",
            ]
            .map(String::from),
        );
        PatternSet::try_phrases(&phrases).unwrap()
    };
}

/// Which branch of the gate decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    /// Prevention or risk-reduction phrasing found
    Prevention,
    /// Current or previous MI patients present
    MiPatients,
    /// Neither phrasing found
    NoEvidence,
}

/// Outcome of the MI-population gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiGateFinding {
    pub verdict: GateVerdict,
    pub details: String,
    pub matched: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl MiGateFinding {
    pub fn passed(&self) -> bool {
        self.verdict == GateVerdict::MiPatients
    }

    /// Reasoning for a gate exclusion.
    pub fn exclusion_reason(&self) -> String {
        format!(
            "CRITICAL EXCLUSION: No current or previous MI patients in the trial - {}",
            self.details
        )
    }
}

/// Evaluate the gate over lower-cased screening text.
pub fn evaluate(text: &str) -> MiGateFinding {
    let prevention = PREVENTION.matches(text);
    if !prevention.is_empty() {
        let matched: Vec<String> = prevention.iter().map(|m| m.label.clone()).collect();
        tracing::debug!(rule = "mi_gate", matched = ?matched, "prevention phrasing");
        return MiGateFinding {
            verdict: GateVerdict::Prevention,
            details: format!("Prevention study excluded: {}", join_first(&matched, 3)),
            evidence: prevention
                .iter()
                .map(|m| m.to_evidence("prevention phrase"))
                .collect(),
            matched,
        };
    }

    let inclusion = INCLUSION.matches(text);
    if !inclusion.is_empty() {
        let matched: Vec<String> = inclusion.iter().map(|m| m.label.clone()).collect();
        return MiGateFinding {
            verdict: GateVerdict::MiPatients,
            details: format!(
                "Current MI patients or patients who have had MI before: {}",
                join_first(&matched, 3)
            ),
            evidence: inclusion
                .iter()
                .map(|m| m.to_evidence("MI population phrase"))
                .collect(),
            matched,
        };
    }

    MiGateFinding {
        verdict: GateVerdict::NoEvidence,
        details: "No clear evidence of current MI patients or patients who have had MI before; \
                  text may be about prevention or risk reduction"
            .to_string(),
        matched: Vec::new(),
        evidence: Vec::new(),
    }
}
