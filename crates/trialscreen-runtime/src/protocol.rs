//! Tagged-line response protocol for remote LLM screening.
//!
//! A response carries three fields anywhere in its text:
//!
//! ```text
//! DECISION: INCLUDE|EXCLUDE|MAYBE
//! CONFIDENCE: 0.0-1.0
//! REASONING: one line of explanation
//! ```
//!
//! `DECISION` is matched case-insensitively. `CONFIDENCE` is clamped into
//! [0, 1]. `REASONING` is the first non-blank text after its tag, which may
//! sit on the tag's line or the next one, up to the end of that line. A
//! missing or malformed
//! field takes its default: MAYBE, 0.5, "No reasoning provided".

use lazy_static::lazy_static;
use regex::Regex;
use trialscreen_core::types::NO_REASONING;
use trialscreen_core::{Decision, ScreeningResult};

/// Wire protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Confidence used when the field is missing or malformed.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

lazy_static! {
    static ref DECISION: Regex = Regex::new(r"(?i)DECISION:\s*(INCLUDE|EXCLUDE|MAYBE)").unwrap();
    static ref CONFIDENCE: Regex = Regex::new(r"CONFIDENCE:\s*([\d.]+)").unwrap();
    static ref REASONING: Regex = Regex::new(r"REASONING:\s*([^\r\n]+)").unwrap();
}

/// Parse a completion into a screening result. Never fails.
pub fn parse_response(response: &str) -> ScreeningResult {
    let decision = DECISION
        .captures(response)
        .and_then(|c| c[1].parse::<Decision>().ok());

    let confidence = CONFIDENCE
        .captures(response)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|c| c.is_finite());

    let reasoning = REASONING
        .captures(response)
        .map(|c| c[1].trim().to_string())
        .filter(|r| !r.is_empty());

    if decision.is_none() || confidence.is_none() || reasoning.is_none() {
        tracing::debug!(
            decision = decision.is_some(),
            confidence = confidence.is_some(),
            reasoning = reasoning.is_some(),
            "response missing protocol fields"
        );
    }

    ScreeningResult::new(
        decision.unwrap_or(Decision::Maybe),
        confidence.unwrap_or(DEFAULT_CONFIDENCE),
        reasoning.unwrap_or_else(|| NO_REASONING.to_string()),
    )
}
