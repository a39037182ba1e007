//! Fallback strategies when a remote LLM call fails.

use serde::{Deserialize, Serialize};
use trialscreen_core::ScreeningResult;

use crate::providers::ProviderError;

/// What LLM mode returns after the provider failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// MAYBE at 0.5 with the provider error in the reasoning
    #[default]
    Maybe,

    /// The stringent rule-based result
    Stringent,
}

impl FallbackStrategy {
    /// Resolve a failed call. `stringent` is the rule-based result for the
    /// same record.
    pub fn resolve(&self, error: &ProviderError, stringent: ScreeningResult) -> ScreeningResult {
        match self {
            FallbackStrategy::Maybe => {
                ScreeningResult::maybe(0.5, format!("LLM unavailable: {}", error))
            }
            FallbackStrategy::Stringent => ScreeningResult::new(
                stringent.decision,
                stringent.confidence,
                format!("LLM unavailable ({}); rule-based: {}", error, stringent.reasoning),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialscreen_core::Decision;

    #[test]
    fn test_default_is_maybe() {
        let result = FallbackStrategy::default().resolve(
            &ProviderError::AuthError,
            ScreeningResult::exclude(0.95, "review"),
        );
        assert_eq!(result.decision, Decision::Maybe);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.reasoning, "LLM unavailable: API key rejected");
    }

    #[test]
    fn test_stringent_keeps_rule_decision() {
        let result = FallbackStrategy::Stringent.resolve(
            &ProviderError::AuthError,
            ScreeningResult::exclude(0.95, "review"),
        );
        assert_eq!(result.decision, Decision::Exclude);
        assert_eq!(result.confidence, 0.95);
        assert!(result.reasoning.ends_with("rule-based: review"));
    }

    #[test]
    fn test_serde_tag() {
        let value = serde_json::to_value(FallbackStrategy::Stringent).unwrap();
        assert_eq!(value, serde_json::json!({ "type": "stringent" }));
    }
}
