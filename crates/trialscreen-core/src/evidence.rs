//! Evidence linking for screening signals.
//!
//! Every axis signal and rule firing points back at the spans of the
//! screening text (or fetched document) that triggered it.

use serde::{Deserialize, Serialize};

/// Where a piece of evidence was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// The record's title + abstract
    Text,
    /// A full document fetched for verification
    Document,
    /// The loaded criteria file
    Criteria,
}

/// A piece of evidence supporting a signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// What this evidence supports
    pub claim: String,

    /// Where the evidence comes from
    pub source: EvidenceSource,

    /// Pointer to the location (e.g., "text[47:72]")
    pub pointer: String,
}

impl Evidence {
    /// Evidence from the screening text.
    pub fn from_text(claim: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            claim: claim.into(),
            source: EvidenceSource::Text,
            pointer: format!("text[{}:{}]", start, end),
        }
    }

    /// Evidence from a fetched document.
    pub fn from_document(claim: impl Into<String>, locator: &str, start: usize, end: usize) -> Self {
        Self {
            claim: claim.into(),
            source: EvidenceSource::Document,
            pointer: format!("document({})[{}:{}]", locator, start, end),
        }
    }

    /// Evidence from a criteria key.
    pub fn from_criteria(claim: impl Into<String>, key: &str) -> Self {
        Self {
            claim: claim.into(),
            source: EvidenceSource::Criteria,
            pointer: format!("criteria.{}", key),
        }
    }
}
