//! Prompts for remote LLM screening.
//!
//! The system prompt is fixed. The user prompt carries the record, any
//! review protocol text from the criteria file and the response format of
//! [`crate::protocol`].

use trialscreen_core::{Criteria, Record};

/// Abstract characters sent to the model.
pub const ABSTRACT_PROMPT_CHARS: usize = 1000;

/// System prompt shared by every screening call.
pub const SYSTEM_PROMPT: &str = "You are a medical research expert specializing in systematic \
reviews and the identification of randomized controlled trials in cardiac research.";

/// Screening instructions. `{title}`, `{abstract}` and `{protocol}` are
/// substituted.
const SCREENING_PROMPT: &str = r#"
Decide whether this article belongs in a systematic review of PRIMARY randomized
controlled trials of pharmacological therapy in myocardial infarction patients.

TITLE: {title}
ABSTRACT: {abstract}

INCLUDE only when ALL of the following hold:
- The article reports original results of a randomized controlled trial
- Participants are current or previous MI patients (STEMI, NSTEMI, acute MI, post-MI)
- The intervention under study is a drug, given during or after the MI
- Outcomes are measured in those MI patients

EXCLUDE when ANY of the following hold:
- Review, meta-analysis, editorial, commentary or guideline
- Observational, registry, cohort, case report or case series design
- Primary or secondary prevention in people without MI
- General diabetes, lipid or hypertension populations with no explicit MI context
- Healthy volunteers or asymptomatic participants
- Procedures, devices or surgery without a drug under evaluation
- Health-system, adherence, education or lifestyle interventions
{protocol}
Check exclusions first, then the three inclusion requirements.

Respond in exactly this format:
DECISION: [INCLUDE/EXCLUDE/MAYBE]
CONFIDENCE: [0.0-1.0]
REASONING: [one line]
"#;

/// First `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Review protocol block from the criteria free text. Empty when the
/// criteria carry none.
fn protocol_section(criteria: &Criteria) -> String {
    let mut section = String::new();
    if !criteria.research_topic.trim().is_empty() {
        section.push_str(&format!("\nREVIEW TOPIC: {}\n", criteria.research_topic.trim()));
    }
    let mut list = |heading: &str, items: &[String]| {
        let items: Vec<&str> = items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !items.is_empty() {
            section.push_str(&format!("\n{}:\n", heading));
            for item in items {
                section.push_str(&format!("- {}\n", item));
            }
        }
    };
    list("Additional inclusion criteria", &criteria.inclusion_criteria[..]);
    list("Additional exclusion criteria", &criteria.exclusion_criteria[..]);
    section
}

/// Build the user prompt for one record.
pub fn screening_prompt(record: &Record, criteria: &Criteria) -> String {
    SCREENING_PROMPT
        .replace("{protocol}", &protocol_section(criteria))
        .replace("{title}", record.title.trim())
        .replace(
            "{abstract}",
            truncate_chars(record.abstract_text.trim(), ABSTRACT_PROMPT_CHARS),
        )
        .trim()
        .to_string()
}
