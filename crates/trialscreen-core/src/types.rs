//! Core data types for screening.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;
use crate::rules::RuleFindings;

/// A bibliographic record to be screened.
///
/// Missing metadata fields are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub title: String,

    #[serde(default, rename = "abstract")]
    pub abstract_text: String,

    #[serde(default)]
    pub authors: String,

    #[serde(default)]
    pub journal: String,

    #[serde(default)]
    pub year: String,

    #[serde(default)]
    pub doi: String,

    #[serde(default)]
    pub pmid: String,
}

impl Record {
    /// Create a record from a title and abstract.
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            abstract_text: abstract_text.into(),
            ..Default::default()
        }
    }

    /// Set the DOI.
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = doi.into();
        self
    }

    /// Set the PubMed identifier.
    pub fn with_pmid(mut self, pmid: impl Into<String>) -> Self {
        self.pmid = pmid.into();
        self
    }

    /// The text every extractor sees: `title + " " + abstract`, lower-cased.
    pub fn screening_text(&self) -> String {
        format!("{} {}", self.title, self.abstract_text).to_lowercase()
    }

    /// Whether a non-blank DOI is present.
    pub fn has_doi(&self) -> bool {
        !self.doi.trim().is_empty()
    }
}

/// Terminal screening decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Include,
    Exclude,
    Maybe,
}

impl Decision {
    /// Lowercase wire form (`include`, `exclude`, `maybe`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Include => "include",
            Decision::Exclude => "exclude",
            Decision::Maybe => "maybe",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Ok(Decision::Include),
            "exclude" => Ok(Decision::Exclude),
            "maybe" => Ok(Decision::Maybe),
            other => Err(format!("unknown decision '{}'", other)),
        }
    }
}

/// Reasoning used when a producer supplies none.
pub const NO_REASONING: &str = "No reasoning provided";

/// Outcome of screening a single record.
///
/// Construction clamps `confidence` into [0, 1] and replaces blank
/// reasoning with [`NO_REASONING`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub decision: Decision,
    pub confidence: f64,
    pub reasoning: String,
}

impl ScreeningResult {
    pub fn new(decision: Decision, confidence: f64, reasoning: impl Into<String>) -> Self {
        let reasoning = reasoning.into();
        Self {
            decision,
            confidence: clamp_confidence(confidence),
            reasoning: if reasoning.trim().is_empty() {
                NO_REASONING.to_string()
            } else {
                reasoning
            },
        }
    }

    pub fn include(confidence: f64, reasoning: impl Into<String>) -> Self {
        Self::new(Decision::Include, confidence, reasoning)
    }

    pub fn exclude(confidence: f64, reasoning: impl Into<String>) -> Self {
        Self::new(Decision::Exclude, confidence, reasoning)
    }

    pub fn maybe(confidence: f64, reasoning: impl Into<String>) -> Self {
        Self::new(Decision::Maybe, confidence, reasoning)
    }

    /// Degraded result for an internal fault: MAYBE at 0.5 with the error text.
    pub fn from_fault(error: &dyn fmt::Display) -> Self {
        Self::maybe(0.5, format!("Screening error: {}", error))
    }
}

/// Clamp a confidence into [0, 1]; NaN collapses to 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// The three classification axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    StudyDesign,
    Intervention,
    Population,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::StudyDesign => write!(f, "study_design"),
            Axis::Intervention => write!(f, "intervention"),
            Axis::Population => write!(f, "population"),
        }
    }
}

macro_rules! axis_label {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

axis_label!(
    /// Study design vocabulary.
    DesignType {
        Review => "review",
        NonRct => "non_rct",
        Rct => "rct",
        LikelyRct => "likely_rct",
        UnclearTrial => "unclear_trial",
        Unclear => "unclear",
    }
);

axis_label!(
    /// Intervention vocabulary.
    InterventionType {
        HealthSystem => "health_system",
        AdherenceBehavioral => "adherence_behavioral",
        ObservationalPharma => "observational_pharma",
        Pharmacological => "pharmacological",
        Combined => "combined",
        NonPharmacological => "non_pharmacological",
        PossiblePharmacological => "possible_pharmacological",
        Unclear => "unclear",
    }
);

axis_label!(
    /// Population vocabulary.
    PopulationType {
        MiPatients => "mi_patients",
        LikelyMiPatients => "likely_mi_patients",
        CardiacPatients => "cardiac_patients",
        NonCardiac => "non_cardiac",
        PossibleCardiac => "possible_cardiac",
        Unclear => "unclear",
    }
);

/// A categorical judgment on one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSignal<L> {
    pub label: L,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Which rule fired and what triggered it
    pub rationale: String,

    /// Indicator category -> number of distinct indicators matched
    #[serde(default)]
    pub raw_counts: BTreeMap<String, usize>,

    /// Matched spans in the screening text
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl<L> AxisSignal<L> {
    pub fn new(label: L, confidence: f64, rationale: impl Into<String>) -> Self {
        Self {
            label,
            confidence: clamp_confidence(confidence),
            rationale: rationale.into(),
            raw_counts: BTreeMap::new(),
            evidence: Vec::new(),
        }
    }

    pub fn with_count(mut self, category: impl Into<String>, count: usize) -> Self {
        self.raw_counts.insert(category.into(), count);
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }

    /// Count recorded for a category, zero when absent.
    pub fn count(&self, category: &str) -> usize {
        self.raw_counts.get(category).copied().unwrap_or(0)
    }
}

/// Signals for all three axes of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSignals {
    pub design: AxisSignal<DesignType>,
    pub intervention: AxisSignal<InterventionType>,
    pub population: AxisSignal<PopulationType>,
}

/// Document-level RCT verification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    ConfirmedRct,
    ConfirmedNonRct,
    #[default]
    Unknown,
}

impl Verification {
    /// `Some(true)` / `Some(false)` when the document was scored, `None` otherwise.
    pub fn as_option(&self) -> Option<bool> {
        match self {
            Verification::ConfirmedRct => Some(true),
            Verification::ConfirmedNonRct => Some(false),
            Verification::Unknown => None,
        }
    }
}

/// Pipeline stage that produced the terminal result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStage {
    TitleCheck,
    MiGate,
    Aggregation,
    /// Criteria-keyword screener, after a low-confidence aggregation
    CriteriaFallback,
}

/// Full trace of one screening pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub result: ScreeningResult,
    pub stage: ScreeningStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<AxisSignals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleFindings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drug_mi_pattern: Option<String>,
    pub verification: Verification,
    pub screened_at: DateTime<Utc>,
}
