//! Prompt assembly
//!
//! Builds one generation request per section from a fixed template, the
//! subject's core numbers and the active design principles. Pure: no I/O.

use crate::core::data::{SectionKind, Subject};
use crate::numerology::cycle::CycleYear;
use crate::numerology::{Category, CoreNumberSet};
use serde::Serialize;
use std::fmt::Write;

const SYSTEM_ROLE: &str = "You are an expert in Makaren numerology writing one section of a personal profile document.";

const NO_CONSULTATION: &str = "The client gave no specific question. Choose the one theme the numbers make most important \
(career, relationships, self-expression, money, or partnership) and include guidance on it.";

/// Fully formed request for the external generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub kind: SectionKind,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Copy of this request asking the generator to remove the listed problems.
    pub fn with_feedback(&self, problems: &[&str]) -> Self {
        let mut user = self.user.clone();
        user.push_str("\n\nYour previous draft of this section was rejected because it contained: ");
        user.push_str(&problems.join("; "));
        user.push_str(". Rewrite the whole section from scratch without any of these.");
        Self { user, ..self.clone() }
    }
}

/// Everything a section prompt may draw on.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub primary: &'a Subject,
    pub primary_numbers: &'a CoreNumberSet,
    pub associate: Option<(&'a Subject, &'a CoreNumberSet)>,
    /// The primary subject read under the maiden name.
    pub maiden: Option<(&'a Subject, &'a CoreNumberSet)>,
    pub cycle: &'a [CycleYear],
    pub consultation: Option<&'a str>,
}

struct SectionTemplate {
    heading: String,
    structure: &'static str,
    tone: &'static str,
    length: &'static str,
}

fn template(kind: SectionKind) -> SectionTemplate {
    match kind {
        SectionKind::Overview => SectionTemplate {
            heading: "Overview".to_string(),
            structure: "Open with the person's overall character as the numbers combine, then their current \
                        position in the personal-year cycle, then guidance on the consultation theme.",
            tone: "Warm, grounded and practical.",
            length: "About 1500-2000 Japanese characters in 5-7 paragraphs.",
        },
        SectionKind::Breakdown(category) => SectionTemplate {
            heading: format!("{} ({})", category.native_label(), category.label()),
            structure: "Explain what this number means in this position, how it shows up in work and relationships, \
                        and one concrete way to use it well.",
            tone: "Specific and realistic; no generic horoscope phrasing.",
            length: "About 400-600 Japanese characters in 2-3 paragraphs.",
        },
        SectionKind::Relationship(index) => SectionTemplate {
            heading: format!("Relationship with person {}", index),
            structure: "Describe how the two people's numbers interact, where they support each other, where \
                        friction is likely, and practical hints for working well together.",
            tone: "Structural and even-handed; never judge either person.",
            length: "About 800-1200 Japanese characters in 3-5 paragraphs.",
        },
    }
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    language: String,
    max_tokens: u32,
}

impl PromptAssembler {
    pub fn new(language: impl Into<String>, max_tokens: u32) -> Self {
        Self { language: language.into(), max_tokens }
    }

    pub fn build_prompt(
        &self,
        kind: SectionKind,
        input: &PromptInput<'_>,
        design_principles: &[String],
    ) -> GenerationRequest {
        let template = template(kind);

        let mut system = String::from(SYSTEM_ROLE);
        let _ = write!(system, "\nWrite in {}.", self.language);
        if !design_principles.is_empty() {
            system.push_str("\n\nFollow these principles in every section:");
            for (i, principle) in design_principles.iter().enumerate() {
                let _ = write!(system, "\n{}. {}", i + 1, principle);
            }
        }

        let mut user = String::new();
        let _ = writeln!(user, "Section: {}", template.heading);
        let _ = writeln!(user, "Structure: {}", template.structure);
        let _ = writeln!(user, "Tone: {}", template.tone);
        let _ = writeln!(user, "Length: {}", template.length);
        user.push('\n');

        match kind {
            SectionKind::Overview => self.overview_body(&mut user, input),
            SectionKind::Breakdown(category) => self.breakdown_body(&mut user, input, category),
            SectionKind::Relationship(_) => self.relationship_body(&mut user, input),
        }

        GenerationRequest {
            kind,
            system,
            user: user.trim_end().to_string(),
            max_tokens: self.max_tokens,
        }
    }

    fn overview_body(&self, out: &mut String, input: &PromptInput<'_>) {
        write_subject(out, "Person", input.primary, input.primary_numbers, &Category::ALL);

        if let Some((maiden, numbers)) = input.maiden {
            maiden_comparison(out, maiden, input.primary_numbers, numbers);
        }

        if !input.cycle.is_empty() {
            out.push_str("\nPersonal-year cycle:\n");
            for year in input.cycle {
                let _ = writeln!(out, "- {}: {} ({})", year.year, year.personal_year, year.meaning);
            }
        }

        out.push('\n');
        match input.consultation.map(str::trim).filter(|c| !c.is_empty()) {
            Some(consultation) => {
                let _ = writeln!(out, "Consultation: {}", consultation);
            }
            None => {
                let _ = writeln!(out, "{}", NO_CONSULTATION);
            }
        }
    }

    fn breakdown_body(&self, out: &mut String, input: &PromptInput<'_>, category: Category) {
        let _ = writeln!(out, "Person: {}", input.primary.name);
        match input.primary_numbers.get(category) {
            Some(value) => {
                let _ = writeln!(out, "{}: {}", category.label(), value);
            }
            None => {
                let _ = writeln!(
                    out,
                    "{}: no value (the inputs this number depends on do not produce one). \
                     Explain briefly what that absence means instead of inventing a number.",
                    category.label()
                );
            }
        }
        out.push_str("\nOther numbers for context:\n");
        for (other, value) in input.primary_numbers.iter().filter(|(c, _)| *c != category) {
            let _ = writeln!(out, "- {}: {}", other.label(), value);
        }
    }

    fn relationship_body(&self, out: &mut String, input: &PromptInput<'_>) {
        write_subject(out, "Person A (the client)", input.primary, input.primary_numbers, Category::relational());
        if let Some((associate, numbers)) = input.associate {
            out.push('\n');
            write_subject(out, "Person B", associate, numbers, Category::relational());
        }
    }
}

/// Numbers that change between the current name and the maiden name.
fn maiden_comparison(out: &mut String, maiden: &Subject, current: &CoreNumberSet, previous: &CoreNumberSet) {
    let _ = writeln!(out, "\nMaiden name: {}", maiden.name);
    let changed: Vec<Category> = Category::ALL
        .into_iter()
        .filter(|category| current.get(*category) != previous.get(*category))
        .collect();
    if changed.is_empty() {
        out.push_str("The maiden name gives the same numbers as the current name.\n");
        return;
    }
    out.push_str("Numbers that changed with the name (mention how the shift may be felt):\n");
    for category in changed {
        let _ = writeln!(
            out,
            "- {}: current {}, maiden {}",
            category.label(),
            current.display(category),
            previous.display(category)
        );
    }
}

fn write_subject(out: &mut String, title: &str, subject: &Subject, numbers: &CoreNumberSet, categories: &[Category]) {
    let _ = writeln!(out, "{}: {} (born {})", title, subject.name, subject.birth_date);
    for category in categories {
        let _ = writeln!(out, "- {}: {}", category.label(), numbers.display(*category));
    }
}
