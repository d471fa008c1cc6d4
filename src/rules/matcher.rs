//! Matching strategies for prohibited patterns.

use crate::core::traits::PatternMatcher;
use crate::utils::error::{AppError, AppResult};
use crate::utils::format::{fold_kana, fold_width};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    Substring,
    Regex,
    Normalized,
}

/// Plain containment check, optionally case-insensitive.
#[derive(Debug)]
pub struct SubstringMatcher {
    id: String,
    description: String,
    needle: String,
    case_sensitive: bool,
}

impl SubstringMatcher {
    pub fn new(id: String, description: String, pattern: &str, case_sensitive: bool) -> Self {
        let needle = if case_sensitive { pattern.to_string() } else { pattern.to_lowercase() };
        Self { id, description, needle, case_sensitive }
    }
}

impl PatternMatcher for SubstringMatcher {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_match(&self, text: &str) -> bool {
        if self.case_sensitive {
            text.contains(&self.needle)
        } else {
            text.to_lowercase().contains(&self.needle)
        }
    }
}

#[derive(Debug)]
pub struct RegexMatcher {
    id: String,
    description: String,
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(id: String, description: String, pattern: &str, case_sensitive: bool) -> AppResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| AppError::Config(format!("Invalid regex for rule '{}': {}", id, e)))?;
        Ok(Self { id, description, regex })
    }
}

impl PatternMatcher for RegexMatcher {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Script-aware containment: width, kana script, case and whitespace are
/// folded on both sides before comparing.
#[derive(Debug)]
pub struct NormalizedMatcher {
    id: String,
    description: String,
    needle: String,
}

impl NormalizedMatcher {
    pub fn new(id: String, description: String, pattern: &str) -> Self {
        Self { id, description, needle: normalize(pattern) }
    }
}

impl PatternMatcher for NormalizedMatcher {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_match(&self, text: &str) -> bool {
        normalize(text).contains(&self.needle)
    }
}

pub fn normalize(text: &str) -> String {
    fold_kana(&fold_width(text))
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compile one matcher of the requested kind.
pub fn build_matcher(
    kind: MatchKind,
    id: String,
    description: String,
    pattern: &str,
    case_sensitive: bool,
) -> AppResult<Box<dyn PatternMatcher>> {
    Ok(match kind {
        MatchKind::Substring => Box::new(SubstringMatcher::new(id, description, pattern, case_sensitive)),
        MatchKind::Regex => Box::new(RegexMatcher::new(id, description, pattern, case_sensitive)?),
        MatchKind::Normalized => Box::new(NormalizedMatcher::new(id, description, pattern)),
    })
}
