//! Validation modules

pub mod rules;

pub use rules::{parse_field_rules, RuleConstraint, RuleParseError, ValidationRule};
