//! Indicator pattern sets shared by extractors and rules.
//!
//! Every indicator is a case-insensitive, word-bounded phrase (internal
//! whitespace matches any run of whitespace) or an explicit regex for
//! forms a phrase cannot express, such as `80mg` or plural suffixes.
//! Counts are per distinct indicator: an indicator that appears three
//! times still counts once.

use regex::Regex;

use crate::evidence::Evidence;

/// One matched indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// The indicator's label (the phrase itself for phrase patterns)
    pub label: String,
    /// Byte offset of the first occurrence
    pub start: usize,
    /// Byte offset one past the first occurrence
    pub end: usize,
}

impl PatternMatch {
    /// Evidence pointing at this match in the screening text.
    pub fn to_evidence(&self, claim: &str) -> Evidence {
        Evidence::from_text(format!("{}: {}", claim, self.label), self.start, self.end)
    }
}

#[derive(Debug, Clone)]
struct Pattern {
    label: String,
    regex: Regex,
}

/// An ordered set of indicators.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

/// Build a word-bounded, whitespace-tolerant regex source for a phrase.
pub fn phrase_source(phrase: &str) -> String {
    let escaped = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let lead = if phrase.trim_start().starts_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    let trail = if phrase.trim_end().ends_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    format!("(?i){}{}{}", lead, escaped, trail)
}

impl PatternSet {
    /// Build a set from static phrases.
    pub fn phrases(phrases: &[&str]) -> Self {
        Self::try_phrases(phrases.iter().copied()).unwrap()
    }

    /// Build a set from arbitrary phrases (e.g. user-supplied keywords).
    pub fn try_phrases<I, S>(phrases: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for phrase in phrases {
            let phrase = phrase.as_ref();
            if phrase.trim().is_empty() {
                continue;
            }
            patterns.push(Pattern {
                label: phrase.trim().to_string(),
                regex: Regex::new(&phrase_source(phrase))?,
            });
        }
        Ok(Self { patterns })
    }

    /// Add labelled raw regexes. Sources are compiled case-insensitive.
    pub fn with_regexes(mut self, entries: &[(&str, &str)]) -> Self {
        for (label, source) in entries {
            self.patterns.push(Pattern {
                label: label.to_string(),
                regex: Regex::new(&format!("(?i){}", source)).unwrap(),
            });
        }
        self
    }

    /// First occurrence of every indicator that fires, in set order.
    pub fn matches(&self, text: &str) -> Vec<PatternMatch> {
        self.patterns
            .iter()
            .filter_map(|p| {
                p.regex.find(text).map(|m| PatternMatch {
                    label: p.label.clone(),
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect()
    }

    /// Labels of every indicator that fires.
    pub fn labels(&self, text: &str) -> Vec<String> {
        self.matches(text).into_iter().map(|m| m.label).collect()
    }

    /// Number of distinct indicators that fire.
    pub fn count(&self, text: &str) -> usize {
        self.patterns.iter().filter(|p| p.regex.is_match(text)).count()
    }

    /// Whether any indicator fires.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(text))
    }

    /// Number of indicators in the set.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set has no indicators. An empty set never matches.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Join the first `n` labels with ", ".
pub fn join_first(labels: &[String], n: usize) -> String {
    labels.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrases_are_word_bounded() {
        let set = PatternSet::phrases(&["mi"]);
        assert!(set.is_match("patients with acute mi were enrolled"));
        assert!(!set.is_match("a mild reduction"));
        assert!(!set.is_match("administered"));
    }

    #[test]
    fn test_blank_phrases_are_skipped() {
        let set = PatternSet::try_phrases(["  ", "stemi", ""]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());

        let empty = PatternSet::try_phrases(["", "   "]).unwrap();
        assert!(empty.is_empty());
        assert!(!empty.is_match("anything at all"));
    }

    #[test]
    fn test_internal_whitespace_is_flexible() {
        let set = PatternSet::phrases(&["randomized controlled trial"]);
        assert!(set.is_match("a randomized\ncontrolled   trial"));
    }

    #[test]
    fn test_hyphenated_phrases() {
        let set = PatternSet::phrases(&["post-mi", "double-blind"]);
        assert_eq!(set.count("post-mi patients in a double-blind study"), 2);
    }

    #[test]
    fn test_phrase_edges_with_punctuation() {
        let set = PatternSet::phrases(&["clinicaltrials.gov"]);
        assert!(set.is_match("registered at clinicaltrials.gov (nct01)"));
        assert!(!set.is_match("clinicaltrialsxgov"));
    }

    #[test]
    fn test_counts_distinct_indicators() {
        let set = PatternSet::phrases(&["drug", "dose"]);
        assert_eq!(set.count("drug drug drug"), 1);
        assert_eq!(set.count("drug at a low dose"), 2);
    }

    #[test]
    fn test_case_insensitive() {
        let set = PatternSet::phrases(&["MACE"]);
        assert!(set.is_match("mace at 12 months"));
    }

    #[test]
    fn test_regex_entries() {
        let set = PatternSet::default().with_regexes(&[("mg", r"\d\s*mg\b|\bmg\b")]);
        assert!(set.is_match("atorvastatin 80mg daily"));
        assert!(set.is_match("80 mg"));
        assert!(!set.is_match("mgmt"));
    }

    #[test]
    fn test_matches_report_first_offsets() {
        let set = PatternSet::phrases(&["trial"]);
        let found = set.matches("this trial and that trial");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, 5);
        assert_eq!(found[0].end, 10);
    }

    #[test]
    fn test_user_phrases_are_escaped() {
        let set = PatternSet::try_phrases(["in vitro (cells)", "  "]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.is_match("an in vitro (cells) assay"));
    }
}
