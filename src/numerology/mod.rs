//! Numerology calculator
//!
//! Core numbers are derived from a subject's birth date and name through a
//! fixed rule table. Each [`CategoryRule`] names the inputs of one category;
//! the reduction itself lives in [`reduce`] and never changes when a
//! category is added.

pub mod cycle;
pub mod letters;
pub mod reduce;

use crate::core::data::{BirthDate, Name, PersonInput, Subject};
use crate::utils::error::AppResult;
use letters::{LetterFilter, LetterTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Numerology categories in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BirthI,
    BirthII,
    Shadow,
    Lineage,
    Ego,
    Social,
    Mission,
    Soul,
    Appearance,
    Stage,
    Hidden,
    Core,
    PersonalYear,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::BirthI,
        Category::BirthII,
        Category::Shadow,
        Category::Lineage,
        Category::Ego,
        Category::Social,
        Category::Mission,
        Category::Soul,
        Category::Appearance,
        Category::Stage,
        Category::Hidden,
        Category::Core,
        Category::PersonalYear,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::BirthI => "birth_i",
            Category::BirthII => "birth_ii",
            Category::Shadow => "shadow",
            Category::Lineage => "lineage",
            Category::Ego => "ego",
            Category::Social => "social",
            Category::Mission => "mission",
            Category::Soul => "soul",
            Category::Appearance => "appearance",
            Category::Stage => "stage",
            Category::Hidden => "hidden",
            Category::Core => "core",
            Category::PersonalYear => "personal_year",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::BirthI => "Birth Number I",
            Category::BirthII => "Birth Number II",
            Category::Shadow => "Shadow Number",
            Category::Lineage => "Lineage Number",
            Category::Ego => "Ego Number",
            Category::Social => "Social Number",
            Category::Mission => "Mission Number",
            Category::Soul => "Soul Number",
            Category::Appearance => "Appearance Number",
            Category::Stage => "Stage Number",
            Category::Hidden => "Hidden Number",
            Category::Core => "Core Number",
            Category::PersonalYear => "Personal Year",
        }
    }

    /// Japanese label used in the rendered document.
    pub fn native_label(&self) -> &'static str {
        match self {
            Category::BirthI => "誕生数Ⅰ",
            Category::BirthII => "誕生数Ⅱ",
            Category::Shadow => "影数",
            Category::Lineage => "家系数",
            Category::Ego => "自我数",
            Category::Social => "社会数",
            Category::Mission => "使命数",
            Category::Soul => "魂数",
            Category::Appearance => "外見数",
            Category::Stage => "演技数",
            Category::Hidden => "隠数",
            Category::Core => "核数",
            Category::PersonalYear => "パーソナルイヤー",
        }
    }

    /// Categories describing how two people meet; used for relationship sections.
    pub fn relational() -> &'static [Category] {
        &[
            Category::BirthI,
            Category::Soul,
            Category::Social,
            Category::Core,
            Category::Shadow,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    Family,
    Given,
    Both,
}

/// Where a category's number comes from.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// Every digit of year, month and day.
    DateDigits,
    /// Day of month.
    Day,
    /// Mapped letters of part of the name.
    Letters(NamePart, LetterFilter),
    /// First mapped letter of the family and of the given name.
    Initials,
    /// Sum of already computed categories; absent ones count as zero.
    Sum(&'static [Category]),
    /// A category plus the birth month.
    WithMonth(Category),
    /// Pairing rule between two categories: a 9 only pairs with 2 or 22
    /// (yielding 2), otherwise the two are summed.
    Shadow(Category, Category),
    /// Cycle position of the reference year, based on a category.
    PersonalYear(Category),
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: Category,
    pub source: Source,
}

/// Evaluation order; every `Sum`/`WithMonth`/`Shadow`/`PersonalYear`
/// dependency appears before the rule that uses it.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule { category: Category::BirthI, source: Source::DateDigits },
    CategoryRule { category: Category::BirthII, source: Source::Day },
    CategoryRule { category: Category::Lineage, source: Source::Letters(NamePart::Family, LetterFilter::All) },
    CategoryRule { category: Category::Ego, source: Source::Letters(NamePart::Given, LetterFilter::All) },
    CategoryRule { category: Category::Social, source: Source::Sum(&[Category::Lineage, Category::Ego]) },
    CategoryRule { category: Category::Mission, source: Source::Sum(&[Category::BirthI, Category::Social]) },
    CategoryRule { category: Category::Soul, source: Source::Letters(NamePart::Both, LetterFilter::Vowels) },
    CategoryRule { category: Category::Appearance, source: Source::Letters(NamePart::Both, LetterFilter::Consonants) },
    CategoryRule { category: Category::Stage, source: Source::WithMonth(Category::Appearance) },
    CategoryRule { category: Category::Hidden, source: Source::Initials },
    CategoryRule { category: Category::Core, source: Source::Sum(&[Category::BirthI, Category::Soul]) },
    CategoryRule { category: Category::Shadow, source: Source::Shadow(Category::BirthI, Category::BirthII) },
    CategoryRule { category: Category::PersonalYear, source: Source::PersonalYear(Category::BirthI) },
];

/// Reduced numbers for one subject. Categories without a derivable value are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreNumberSet {
    values: BTreeMap<Category, u32>,
}

impl CoreNumberSet {
    pub fn get(&self, category: Category) -> Option<u32> {
        self.values.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        self.values.iter().map(|(c, v)| (*c, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// "7", or "-" when the category has no value.
    pub fn display(&self, category: Category) -> String {
        self.get(category).map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
    }
}

/// Pure calculator bound to a letter table and the year used for the personal cycle.
#[derive(Debug, Clone)]
pub struct Calculator {
    table: Arc<LetterTable>,
    reference_year: i32,
}

impl Calculator {
    pub fn new(table: Arc<LetterTable>, reference_year: i32) -> Self {
        Self { table, reference_year }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Validate raw input and compute its numbers.
    pub fn compute_input(&self, input: &PersonInput) -> AppResult<CoreNumberSet> {
        let name = Name::parse(&input.name)?;
        let birth_date = BirthDate::parse(&input.birth_date)?;
        Ok(self.compute(&Subject::primary(name, birth_date)))
    }

    pub fn compute(&self, subject: &Subject) -> CoreNumberSet {
        let mut set = CoreNumberSet::default();
        for rule in CATEGORY_RULES {
            if let Some(value) = self.evaluate(rule.source, subject, &set) {
                set.values.insert(rule.category, value);
            }
        }
        set
    }

    /// Birth Number I: every digit of the date, reduced.
    pub fn birth_number(&self, date: &BirthDate) -> Option<u32> {
        let digits = format!("{}{}{}", date.year(), date.month(), date.day());
        self.reduce(digits.chars().filter_map(|c| c.to_digit(10)).sum())
    }

    fn reduce(&self, n: u32) -> Option<u32> {
        reduce::reduce(n, self.table.master_values())
    }

    fn evaluate(&self, source: Source, subject: &Subject, known: &CoreNumberSet) -> Option<u32> {
        let date = &subject.birth_date;
        let name = &subject.name;
        let value_of = |c: Category| known.get(c).unwrap_or(0);

        match source {
            Source::DateDigits => self.birth_number(date),
            Source::Day => self.reduce(date.day()),
            Source::Letters(part, filter) => {
                let sum = match part {
                    NamePart::Family => self.table.sum(name.family(), filter),
                    NamePart::Given => self.table.sum(name.given(), filter),
                    NamePart::Both => {
                        self.table.sum(name.family(), filter) + self.table.sum(name.given(), filter)
                    }
                };
                self.reduce(sum)
            }
            Source::Initials => {
                self.reduce(self.table.initial(name.family()) + self.table.initial(name.given()))
            }
            Source::Sum(categories) => self.reduce(categories.iter().map(|c| value_of(*c)).sum()),
            Source::WithMonth(category) => {
                // November always counts as 11, whatever the table's master values.
                let month = match date.month() {
                    11 => 11,
                    month => self.reduce(month).unwrap_or(0),
                };
                self.reduce(value_of(category) + month)
            }
            Source::Shadow(a, b) => {
                let (a, b) = (value_of(a), value_of(b));
                let pairs_with_two = |x: u32| x == 2 || x == 22;
                match (a, b) {
                    (9, other) | (other, 9) if pairs_with_two(other) => Some(2),
                    (9, _) | (_, 9) => None,
                    _ => self.reduce(a + b),
                }
            }
            Source::PersonalYear(category) => {
                Some(cycle::personal_year(known.get(category), self.reference_year))
            }
        }
    }
}
