//! Criteria parsing and validation.
//!
//! Criteria files are YAML or JSON validated against an embedded JSON
//! Schema, then compiled into keyword matchers once per run.

mod parser;
mod schema;

pub use parser::{CompiledCriteria, Criteria, CriteriaError};
pub use schema::validate_criteria_schema;
