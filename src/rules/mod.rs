//! Rule set: design principles and prohibited patterns
//!
//! Loaded once at start-up and shared read-only by every profile. A rule
//! file that fails to parse or compile is rejected as a whole.

pub mod matcher;
pub mod validator;

use crate::core::traits::PatternMatcher;
use crate::utils::error::{AppError, AppResult};
use matcher::{MatchKind, build_matcher};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Rule set compiled into the binary, used when no rules file is configured.
pub const DEFAULT_RULES: &str = include_str!("../../rules/default.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    design_principles: Vec<String>,
    prohibited: Vec<ProhibitedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProhibitedEntry {
    id: String,
    pattern: String,
    #[serde(default)]
    kind: MatchKind,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug)]
pub struct RuleSet {
    design_principles: Vec<String>,
    matchers: Vec<Box<dyn PatternMatcher>>,
}

impl RuleSet {
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read rules file {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn builtin() -> AppResult<Self> {
        Self::from_toml(DEFAULT_RULES)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let file: RuleFile = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse rules file: {}", e)))?;

        let design_principles: Vec<String> = file
            .design_principles
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let mut seen = HashSet::new();
        let mut matchers = Vec::with_capacity(file.prohibited.len());
        for entry in file.prohibited {
            let id = entry.id.trim().to_string();
            if id.is_empty() {
                return Err(AppError::Config("Prohibited pattern is missing an id".to_string()));
            }
            if entry.pattern.trim().is_empty() {
                return Err(AppError::Config(format!("Prohibited pattern '{}' is empty", id)));
            }
            if !seen.insert(id.clone()) {
                return Err(AppError::Config(format!("Duplicate prohibited pattern id '{}'", id)));
            }
            let description = entry.description.unwrap_or_else(|| entry.pattern.clone());
            matchers.push(build_matcher(entry.kind, id, description, &entry.pattern, entry.case_sensitive)?);
        }

        Ok(Self { design_principles, matchers })
    }

    pub fn design_principles(&self) -> &[String] {
        &self.design_principles
    }

    pub fn pattern_count(&self) -> usize {
        self.matchers.len()
    }

    /// Ids of every prohibited pattern found in `text`; empty when clean.
    pub fn matches(&self, text: &str) -> BTreeSet<String> {
        self.matchers
            .iter()
            .filter(|m| m.is_match(text))
            .map(|m| m.id().to_string())
            .collect()
    }

    /// Descriptions of the given pattern ids, deduplicated, for rewrite instructions.
    pub fn describe<'a>(&'a self, ids: &BTreeSet<String>) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.matchers
            .iter()
            .filter(|m| ids.contains(m.id()))
            .map(|m| m.description())
            .filter(|d| seen.insert(*d))
            .collect()
    }
}
