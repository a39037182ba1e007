//! Full-text RCT scorer.
//!
//! Additive points over ten indicator categories. A document is an RCT iff
//! its total reaches [`RCT_THRESHOLD`]. This is the most authoritative RCT
//! judgment available and is used both on fetched documents and, by the
//! criteria screener, on the record text itself.
//!
//! | Category | Points |
//! |----------|--------|
//! | Randomization | +4 |
//! | Control group | +4 |
//! | Human subjects (no animal-model language) | +2 |
//! | Animal model | −3 |
//! | Intervention structure | +2 |
//! | Clinical outcomes | +2 |
//! | Methods narration | +3 |
//! | Study design | +1 |
//! | Statistical analysis | +1 |
//! | Therapeutic intervention | +2 |
//! | Non-RCT study type | −5 |
//! | Early phase study | −2 |

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::extractors::PatternSet;

/// Minimum score for an RCT judgment.
pub const RCT_THRESHOLD: i32 = 6;

lazy_static! {
    static ref RANDOMIZATION: PatternSet = PatternSet::phrases(&[
        "randomized", "randomised", "randomly assigned", "random allocation",
        "double-blind, placebo-controlled randomized trial",
        "single-blind randomized", "triple-blind randomized",
        "randomization procedure", "randomisation procedure",
        "computer-generated randomization", "block randomization",
        "stratified randomization", "permuted block randomization",
        "clinical trial", "controlled trial", "controlled study",
        "randomized clinical trial", "randomised clinical trial",
        "multicenter trial", "multicentre trial", "prospective trial",
    ]);

    static ref CONTROL_GROUP: PatternSet = PatternSet::phrases(&[
        "control group", "placebo group", "placebo-controlled",
        "active control", "standard therapy control", "usual care control",
        "comparator group", "reference group", "control arm",
        "placebo arm", "standard treatment arm",
    ]);

    static ref HUMAN_SUBJECTS: PatternSet = PatternSet::phrases(&[
        "patients", "participants", "subjects", "volunteers",
        "enrolled patients", "study participants", "clinical trial participants",
        "human subjects", "adult patients", "hospitalized patients",
    ]);

    static ref ANIMAL_MODEL: PatternSet = PatternSet::phrases(&[
        "animal model", "mouse model", "rat model", "canine model",
        "porcine model", "in vitro", "cell culture", "laboratory animals",
    ]);

    static ref INTERVENTION_STRUCTURE: PatternSet = PatternSet::phrases(&[
        "experimental treatment", "intervention group", "treatment group",
        "active treatment", "study drug", "investigational drug",
        "versus", "vs", "compared with", "compared to",
        "treatment arm", "intervention arm", "experimental arm",
    ]);

    static ref CLINICAL_OUTCOMES: PatternSet = PatternSet::phrases(&[
        "primary endpoint", "secondary endpoint", "primary outcome",
        "secondary outcome", "clinical outcomes", "mortality",
        "hospitalization", "cardiovascular events", "mace",
        "major adverse cardiac events", "survival", "death",
        "myocardial infarction", "stroke", "heart failure",
        "arrhythmia recurrence", "symptom improvement",
    ]);

    static ref METHODS_NARRATION: PatternSet = PatternSet::phrases(&[
        "we conducted a randomized", "we performed a randomized",
        "this randomized trial", "this double-blind study",
        "multicenter randomized trial", "phase iii trial",
        "prospective randomized study", "randomized clinical trial",
        "we randomly assigned", "patients were randomly assigned",
    ]);

    static ref STUDY_DESIGN: PatternSet = PatternSet::phrases(&[
        "double-blind", "single-blind", "triple-blind", "blinded",
        "masked", "open-label", "crossover design", "parallel-group",
        "factorial design", "cluster randomized", "crossover trial",
    ]);

    static ref STATISTICS: PatternSet = PatternSet::phrases(&[
        "intention-to-treat", "per-protocol analysis", "power calculation",
        "sample size calculation", "interim analysis", "efficacy analysis",
        "safety analysis", "statistical significance", "p-value",
        "confidence interval", "hazard ratio", "odds ratio",
    ]);

    static ref THERAPEUTIC: PatternSet = PatternSet::phrases(&[
        "adjuvant therapy", "adjunctive therapy", "add-on therapy",
        "combination therapy", "therapeutic intervention",
        "treatment protocol", "therapy evaluation",
        "drug comparison", "medication study", "treatment comparison",
        "efficacy study", "safety and efficacy", "therapeutic trial",
        "intervention study", "treatment effect", "therapy outcome",
    ]);

    static ref STRONG_NEGATIVES: PatternSet = PatternSet::phrases(&[
        "systematic review", "meta-analysis", "observational study",
        "retrospective study", "case-control study", "cohort study",
        "cross-sectional study", "case report", "case series",
        "registry study", "database analysis", "survey study",
        "national cardiovascular data registry", "registry data", "registry analysis",
        "hospital registry", "administrative database", "claims database",
        "electronic health record", "ehr", "health records analysis",
    ]);

    static ref WEAK_NEGATIVES: PatternSet = PatternSet::phrases(&[
        "descriptive study", "pilot study", "feasibility study",
        "dose-finding study", "phase i", "phase ii",
    ]);
}

/// Result of scoring one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RctScore {
    pub score: i32,

    /// Categories that contributed, in scoring order
    pub categories: Vec<String>,
}

impl RctScore {
    pub fn is_rct(&self) -> bool {
        self.score >= RCT_THRESHOLD
    }

    pub fn summary(&self) -> String {
        format!(
            "RCT score {} ({})",
            self.score,
            if self.categories.is_empty() {
                "no indicators".to_string()
            } else {
                self.categories.join(", ")
            }
        )
    }
}

/// Score lower-cased text.
pub fn score(text: &str) -> RctScore {
    let mut total = 0;
    let mut categories = Vec::new();

    let mut add = |fired: bool, points: i32, name: &str| {
        if fired {
            total += points;
            categories.push(name.to_string());
        }
    };

    add(RANDOMIZATION.is_match(text), 4, "Randomization");
    add(CONTROL_GROUP.is_match(text), 4, "Control Group");

    let has_humans = HUMAN_SUBJECTS.is_match(text);
    let has_animals = ANIMAL_MODEL.is_match(text);
    add(has_humans && !has_animals, 2, "Human Subjects");
    add(has_animals, -3, "Animal Study (penalty)");

    add(INTERVENTION_STRUCTURE.is_match(text), 2, "Intervention Structure");
    add(CLINICAL_OUTCOMES.is_match(text), 2, "Clinical Outcomes");
    add(METHODS_NARRATION.is_match(text), 3, "Methods Style");
    add(STUDY_DESIGN.is_match(text), 1, "Study Design");
    add(STATISTICS.is_match(text), 1, "Statistical Analysis");
    add(THERAPEUTIC.is_match(text), 2, "Therapeutic Intervention");
    add(STRONG_NEGATIVES.is_match(text), -5, "Non-RCT Study Type (penalty)");
    add(WEAK_NEGATIVES.is_match(text), -2, "Early Phase Study (penalty)");

    tracing::debug!(score = total, categories = ?categories, "full-text RCT score");

    RctScore {
        score: total,
        categories,
    }
}
