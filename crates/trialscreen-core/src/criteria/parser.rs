//! Criteria parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::extractors::PatternSet;

use super::schema::validate_criteria_schema;

/// Errors that can occur when loading criteria.
#[derive(Error, Debug)]
pub enum CriteriaError {
    #[error("Failed to read criteria file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Criteria validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid keyword pattern: {0}")]
    PatternError(#[from] regex::Error),
}

/// Externally supplied screening criteria.
///
/// Every list defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    /// One-line statement of the review question
    #[serde(default)]
    pub research_topic: String,

    /// Each match adds 1 to the exclusion score
    #[serde(default)]
    pub exclude_keywords: Vec<String>,

    /// Each match adds 2 to the exclusion score
    #[serde(default)]
    pub study_types_exclude: Vec<String>,

    /// Cited in inclusion reasoning
    #[serde(default)]
    pub include_keywords: Vec<String>,

    #[serde(default)]
    pub inclusion_criteria: Vec<String>,

    #[serde(default)]
    pub exclusion_criteria: Vec<String>,
}

impl Criteria {
    /// Parse criteria from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, CriteriaError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse criteria from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CriteriaError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse criteria from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CriteriaError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse criteria from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CriteriaError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a criteria file, choosing the format by extension
    /// (`.json` is JSON, anything else YAML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CriteriaError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_yaml_file(path)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, CriteriaError> {
        // An empty YAML document deserializes to null
        let value = if value.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            value
        };

        validate_criteria_schema(&value)
            .map_err(|errors| CriteriaError::ValidationError(errors.join("; ")))?;

        let criteria: Criteria = serde_json::from_value(value)?;
        criteria.validate()?;
        Ok(criteria)
    }

    /// Checks the schema cannot express.
    fn validate(&self) -> Result<(), CriteriaError> {
        let mut seen = std::collections::HashSet::new();
        for keyword in self.exclude_keywords.iter().chain(&self.study_types_exclude) {
            if !seen.insert(keyword.trim().to_lowercase()) {
                return Err(CriteriaError::ValidationError(format!(
                    "Duplicate exclusion keyword: {}",
                    keyword.trim()
                )));
            }
        }
        Ok(())
    }

    /// Compile keyword lists into matchers.
    pub fn compile(self) -> Result<CompiledCriteria, CriteriaError> {
        Ok(CompiledCriteria {
            exclude: PatternSet::try_phrases(&self.exclude_keywords)?,
            study_types: PatternSet::try_phrases(&self.study_types_exclude)?,
            include: PatternSet::try_phrases(&self.include_keywords)?,
            criteria: self,
        })
    }
}

/// Criteria with their keyword matchers built, ready for screening.
///
/// Shared read-only across records.
#[derive(Debug, Clone)]
pub struct CompiledCriteria {
    criteria: Criteria,
    exclude: PatternSet,
    study_types: PatternSet,
    include: PatternSet,
}

impl CompiledCriteria {
    /// Compiled empty criteria: no keyword contributes.
    pub fn empty() -> Self {
        Self {
            criteria: Criteria::default(),
            exclude: PatternSet::default(),
            study_types: PatternSet::default(),
            include: PatternSet::default(),
        }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Matched `exclude_keywords` entries.
    pub fn excluded_keywords(&self, text: &str) -> Vec<String> {
        self.exclude.labels(text)
    }

    /// Matched `study_types_exclude` entries.
    pub fn excluded_study_types(&self, text: &str) -> Vec<String> {
        self.study_types.labels(text)
    }

    /// Matched `include_keywords` entries.
    pub fn included_keywords(&self, text: &str) -> Vec<String> {
        self.include.labels(text)
    }
}

impl TryFrom<Criteria> for CompiledCriteria {
    type Error = CriteriaError;

    fn try_from(criteria: Criteria) -> Result<Self, Self::Error> {
        criteria.compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_criteria() {
        let yaml = r#"
research_topic: "Drug therapy after MI"
exclude_keywords:
  - pediatric
study_types_exclude:
  - case report
include_keywords:
  - placebo
"#;
        let criteria = Criteria::from_yaml(yaml).unwrap();
        assert_eq!(criteria.exclude_keywords, vec!["pediatric"]);
        assert!(criteria.inclusion_criteria.is_empty());
    }

    #[test]
    fn test_empty_yaml_is_empty_criteria() {
        let criteria = Criteria::from_yaml("").unwrap();
        assert_eq!(criteria, Criteria::default());
    }

    #[test]
    fn test_json_criteria() {
        let criteria =
            Criteria::from_json(r#"{"study_types_exclude": ["meta-analysis"]}"#).unwrap();
        assert_eq!(criteria.study_types_exclude.len(), 1);
    }

    #[test]
    fn test_schema_violation_is_reported() {
        let err = Criteria::from_json(r#"{"exclude_keywords": "not a list"}"#).unwrap_err();
        assert!(matches!(err, CriteriaError::ValidationError(_)));
    }

    #[test]
    fn test_duplicate_keyword_rejected() {
        let err = Criteria::from_json(
            r#"{"exclude_keywords": ["Registry"], "study_types_exclude": ["registry"]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate exclusion keyword"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Criteria::from_json("{").unwrap_err(),
            CriteriaError::JsonError(_)
        ));
    }

    #[test]
    fn test_compiled_matching() {
        let compiled = Criteria {
            exclude_keywords: vec!["pediatric".into(), "in vitro".into()],
            study_types_exclude: vec!["case report".into()],
            include_keywords: vec!["placebo".into()],
            ..Default::default()
        }
        .compile()
        .unwrap();

        let text = "a pediatric case report";
        assert_eq!(compiled.excluded_keywords(text), vec!["pediatric"]);
        assert_eq!(compiled.excluded_study_types(text), vec!["case report"]);
        assert!(compiled.included_keywords(text).is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = Criteria::from_file("/nonexistent/criteria.yaml").unwrap_err();
        assert!(matches!(err, CriteriaError::IoError(_)));
    }
}
