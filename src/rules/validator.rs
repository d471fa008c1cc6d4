//! Content validation against the rule set.

use super::RuleSet;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Ok,
    Violated(BTreeSet<String>),
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationResult::Ok)
    }

    pub fn violations(&self) -> Vec<String> {
        match self {
            ValidationResult::Ok => Vec::new(),
            ValidationResult::Violated(ids) => ids.iter().cloned().collect(),
        }
    }
}

/// Check generated text against the prohibited patterns. Empty text is
/// never acceptable output and is reported as its own violation.
pub fn validate(text: &str, rules: &RuleSet) -> ValidationResult {
    let mut violated = rules.matches(text);
    if text.trim().is_empty() {
        violated.insert(EMPTY_TEXT.to_string());
    }
    if violated.is_empty() {
        ValidationResult::Ok
    } else {
        ValidationResult::Violated(violated)
    }
}

/// Pseudo pattern id reported for blank generator output.
pub const EMPTY_TEXT: &str = "empty-text";
