//! Signal extractors for the three classification axes.
//!
//! Each extractor answers one question about a record:
//!
//! | Extractor | Question |
//! |-----------|----------|
//! | [`DesignExtractor`] | Is this a primary randomized controlled trial? |
//! | [`InterventionExtractor`] | Is the intervention pharmacological? |
//! | [`PopulationExtractor`] | Are the participants myocardial infarction patients? |
//!
//! Extractors are pure: they read the lower-cased `title + " " + abstract`
//! and never share state, so they can run in any order or in parallel.

mod design;
mod intervention;
pub mod patterns;
mod population;

pub use design::DesignExtractor;
pub use intervention::InterventionExtractor;
pub use patterns::{PatternMatch, PatternSet};
pub use population::PopulationExtractor;

use crate::types::{Axis, AxisSignal, AxisSignals};

/// A deterministic classifier for one axis.
pub trait SignalExtractor: Send + Sync {
    /// Vocabulary this extractor labels with.
    type Label;

    /// The axis this extractor covers.
    fn axis(&self) -> Axis;

    /// The question this extractor answers.
    fn question(&self) -> &'static str;

    /// Classify normalized screening text.
    fn extract(&self, text: &str) -> AxisSignal<Self::Label>;
}

/// Run all three deterministic extractors.
pub fn extract_all(text: &str) -> AxisSignals {
    AxisSignals {
        design: DesignExtractor::new().extract(text),
        intervention: InterventionExtractor::new().extract(text),
        population: PopulationExtractor::new().extract(text),
    }
}

pub(crate) fn evidence_for(matches: &[PatternMatch], claim: &str) -> Vec<crate::evidence::Evidence> {
    matches.iter().map(|m| m.to_evidence(claim)).collect()
}
