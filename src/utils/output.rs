use colored::*;
use crate::core::data::{Profile, Section, SectionKind, Subject};
use crate::numerology::cycle::CycleYear;
use crate::numerology::{Category, CoreNumberSet};
use crate::utils::format::truncate_string;
use anyhow::Result;
use std::io::{self, Write};

/// Marker the document renderer turns into a page break.
pub const PAGE_BREAK: &str = "[[PAGEBREAK]]";

pub struct OutputStyle;

impl OutputStyle {
    pub fn content(text: &str) -> ColoredString {
        text.clear()
    }

    pub fn number(text: &str) -> ColoredString {
        text.bright_yellow().bold()
    }

    pub fn title(text: &str) -> ColoredString {
        text.bright_blue().bold()
    }

    pub fn header(text: &str) -> ColoredString {
        text.bold()
    }

    pub fn label(text: &str) -> ColoredString {
        text.cyan()
    }

    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    pub fn info(text: &str) -> ColoredString {
        text.blue()
    }

    pub fn muted(text: &str) -> ColoredString {
        text.dimmed()
    }

    pub fn separator() -> String {
        "─".repeat(50)
    }

    pub fn header_separator() -> String {
        "═".repeat(50)
    }

    pub fn print_header(title: &str) {
        println!("{}", Self::title(title));
        println!("{}", Self::header_separator());
    }

    pub fn print_field_colored(label: &str, value: &str, color_fn: impl Fn(&str) -> ColoredString) {
        println!("{:>14}: {}", Self::label(label), color_fn(value));
    }

    pub fn print_subject(subject: &Subject) {
        Self::print_field_colored("Name", subject.name.full(), Self::content);
        Self::print_field_colored("Birth date", &subject.birth_date.to_string(), Self::content);
    }

    /// Category table; absent values are shown as a dash.
    pub fn print_numbers(subject: &Subject, numbers: &CoreNumberSet) {
        OutputStyle::print_header(&format!("🔢 {}", subject.name));
        Self::print_field_colored("Birth date", &subject.birth_date.to_string(), Self::muted);
        println!();
        for category in Category::ALL {
            let value = numbers.display(category);
            let styled = if numbers.get(category).is_some() {
                Self::number(&value)
            } else {
                Self::muted(&value)
            };
            println!(
                "  {:<18} {:<8} {}",
                Self::label(category.label()),
                category.native_label(),
                styled
            );
        }
    }

    pub fn print_cycle(cycle: &[CycleYear], current_year: i32) {
        OutputStyle::print_header("📅 Nine-year cycle");
        for year in cycle {
            let marker = if year.year == current_year { "▶" } else { " " };
            println!(
                "{} {}  {}  {}",
                marker,
                Self::label(&year.year.to_string()),
                Self::number(&year.personal_year.to_string()),
                Self::content(year.meaning)
            );
        }
    }

    /// One line per section with status, attempts and a text preview.
    pub fn print_profile_summary(profile: &Profile) {
        OutputStyle::print_header(&format!("📜 Profile for {}", profile.primary.name));
        Self::print_field_colored("ID", &profile.id.to_string(), Self::muted);
        Self::print_subject(&profile.primary);
        if let Some((maiden, _)) = &profile.maiden {
            Self::print_field_colored("Maiden name", maiden.name.full(), Self::content);
        }
        Self::print_field_colored("Sections", &profile.sections.len().to_string(), Self::info);
        Self::print_field_colored("Associates", &profile.associates.len().to_string(), Self::info);
        println!("{}", Self::separator());

        for section in &profile.sections {
            let status = if section.is_verified() {
                Self::success("verified")
            } else {
                Self::warning("unverified")
            };
            println!(
                "{:<28} {:<10} {} {}",
                Self::header(&section_title(section)),
                status,
                Self::muted(&format!("attempts={}", section.attempts)),
                Self::content(&truncate_string(&section.text.replace('\n', " "), 40))
            );
            if !section.violations.is_empty() {
                println!("    {}", Self::warning(&format!("violations: {}", section.violations.join(", "))));
            }
            if let Some(failure) = &section.failure {
                println!("    {}", Self::error(failure));
            }
        }
    }
}

/// Heading printed above a section in the rendered document.
pub fn section_title(section: &Section) -> String {
    match section.kind {
        SectionKind::Overview => "Overview".to_string(),
        SectionKind::Breakdown(category) => format!("{} ({})", category.native_label(), category.label()),
        SectionKind::Relationship(index) => match section.subjects.get(1) {
            Some(associate) => format!("Relationship with {}", associate.name),
            None => format!("Relationship {}", index),
        },
    }
}

/// Plain-text hand-off for the document renderer.
///
/// Sections appear in profile order, each under its heading. A page-break
/// marker precedes the first relationship section.
pub fn render_plain(profile: &Profile) -> String {
    let mut out = String::new();
    let mut relationships_started = false;

    for section in &profile.sections {
        if section.kind.is_relationship() && !relationships_started {
            relationships_started = true;
            out.push_str(PAGE_BREAK);
            out.push_str("\n\n");
        }
        out.push_str(&section_title(section));
        out.push_str("\n\n");
        out.push_str(section.text.trim_end());
        out.push_str("\n\n");
    }

    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

pub fn print_warning(message: &str) {
    println!("⚠️  {}", OutputStyle::warning(message));
}

pub fn print_success(message: &str) {
    println!("✅ {}", OutputStyle::success(message));
}

pub fn prompt_yes_no(prompt: &str) -> Result<bool> {
    loop {
        print!("{} [y/N]: ", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => println!("Please enter 'y' or 'n'"),
        }
    }
}
