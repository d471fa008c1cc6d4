//! Core data structures for profile generation
//!
//! Subjects and their validated inputs, the plan selector, and the
//! section/profile types handed to the document renderer.

use crate::numerology::{Category, CoreNumberSet};
use crate::utils::error::{AppError, AppResult, InputError};
use crate::utils::format::{collapse_whitespace, fold_width};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// Upper bound on associates per profile.
pub const MAX_ASSOCIATES: usize = 10;

const MIN_BIRTH_YEAR: i32 = 1900;
const MAX_BIRTH_YEAR: i32 = 2100;

static BIRTH_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{4})[/.\-](\d{1,2})[/.\-](\d{1,2})\s*$").expect("birth date pattern is valid")
});

/// A validated Gregorian birth date within the supported year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    /// Parse `YYYY/MM/DD`, `YYYY-MM-DD` or `YYYY.MM.DD`; full-width digits are accepted.
    pub fn parse(input: &str) -> AppResult<Self> {
        let normalized = fold_width(input);
        let invalid = || AppError::InvalidInput(InputError::InvalidBirthDate(input.trim().to_string()));

        let caps = BIRTH_DATE_PATTERN.captures(&normalized).ok_or_else(invalid)?;
        let year: i32 = caps[1].parse().map_err(|_| invalid())?;
        let month: u32 = caps[2].parse().map_err(|_| invalid())?;
        let day: u32 = caps[3].parse().map_err(|_| invalid())?;

        Self::from_ymd(year, month, day).map_err(|_| invalid())
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> AppResult<Self> {
        if !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&year) {
            return Err(InputError::InvalidBirthDate(format!("{:04}/{:02}/{:02}", year, month, day)).into());
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .map(BirthDate)
            .ok_or_else(|| InputError::InvalidBirthDate(format!("{:04}/{:02}/{:02}", year, month, day)).into())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y/%m/%d"))
    }
}

impl TryFrom<String> for BirthDate {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BirthDate::parse(&value)
    }
}

impl From<BirthDate> for String {
    fn from(value: BirthDate) -> Self {
        value.to_string()
    }
}

/// A subject's name, normalised to upper-case with collapsed whitespace.
///
/// The first whitespace-separated token is the family name and the rest is
/// the given name. A single-token name has an empty given name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name {
    full: String,
}

impl Name {
    pub fn parse(input: &str) -> AppResult<Self> {
        let full = collapse_whitespace(&fold_width(input)).to_uppercase();
        if full.is_empty() {
            return Err(InputError::EmptyName.into());
        }
        Ok(Self { full })
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn family(&self) -> &str {
        self.full.split(' ').next().unwrap_or_default()
    }

    pub fn given(&self) -> &str {
        self.full.split_once(' ').map(|(_, given)| given).unwrap_or_default()
    }

    /// The same given name under another family name.
    pub fn with_family(&self, family: &str) -> AppResult<Self> {
        let family = Name::parse(family)?;
        match self.given() {
            "" => Ok(family),
            given => Name::parse(&format!("{} {}", family.full, given)),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl TryFrom<String> for Name {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Name::parse(&value)
    }
}

impl From<Name> for String {
    fn from(value: Name) -> Self {
        value.full
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Associate(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub name: Name,
    pub birth_date: BirthDate,
    pub role: Role,
}

impl Subject {
    pub fn primary(name: Name, birth_date: BirthDate) -> Self {
        Self { name, birth_date, role: Role::Primary }
    }

    /// `index` is 1-based and fixes the associate's position in the output.
    pub fn associate(name: Name, birth_date: BirthDate, index: u8) -> Self {
        Self { name, birth_date, role: Role::Associate(index) }
    }

    pub fn associate_index(&self) -> Option<u8> {
        match self.role {
            Role::Primary => None,
            Role::Associate(index) => Some(index),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plan {
    #[default]
    #[serde(rename = "solo")]
    Solo,
    #[serde(rename = "withAssociates")]
    WithAssociates,
}

/// Raw person entry as supplied by the caller, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonInput {
    pub name: String,
    pub birth_date: String,
}

/// Inbound profile request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub primary: PersonInput,
    #[serde(default)]
    pub associates: Vec<PersonInput>,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub consultation: Option<String>,
    /// Family name before marriage; the primary subject is also read under it.
    #[serde(default)]
    pub maiden_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SectionKind {
    Overview,
    Breakdown(Category),
    Relationship(u8),
}

impl SectionKind {
    /// Canonical order: overview, category breakdowns in enumeration order, then relationships.
    pub fn primary_kinds() -> Vec<SectionKind> {
        std::iter::once(SectionKind::Overview)
            .chain(Category::ALL.iter().copied().map(SectionKind::Breakdown))
            .collect()
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, SectionKind::Relationship(_))
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Overview => f.write_str("overview"),
            SectionKind::Breakdown(category) => write!(f, "breakdown:{}", category.key()),
            SectionKind::Relationship(index) => write!(f, "relationship:{}", index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Verified,
    Unverified,
}

/// One generated block of the profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub subjects: Vec<Subject>,
    pub text: String,
    pub status: SectionStatus,
    /// Generation attempts made, including the first.
    pub attempts: u32,
    /// Prohibited-pattern ids still present when the section was finalised.
    pub violations: Vec<String>,
    /// Last backend failure, when no attempt produced acceptable text.
    pub failure: Option<String>,
}

impl Section {
    pub fn is_verified(&self) -> bool {
        self.status == SectionStatus::Verified
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileState {
    Init,
    ComputingCore,
    GeneratingPrimarySections,
    GeneratingRelationshipSection,
    Assembled,
    Done,
    Failed,
}

/// Ordered sections for one request, ready for the document renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub primary: Subject,
    pub primary_numbers: CoreNumberSet,
    /// The primary subject read under the maiden name, when one differs.
    #[serde(default)]
    pub maiden: Option<(Subject, CoreNumberSet)>,
    pub associates: Vec<(Subject, CoreNumberSet)>,
    pub sections: Vec<Section>,
    pub states: Vec<ProfileState>,
}

impl Profile {
    pub fn unverified_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| !s.is_verified())
    }

    pub fn relationship_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.kind.is_relationship())
    }
}
