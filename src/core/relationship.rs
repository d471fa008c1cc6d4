//! Relationship expansion
//!
//! Turns the caller's associate list into indexed subjects according to the
//! selected plan, and pairs each of them with the primary subject.

use crate::core::data::{BirthDate, MAX_ASSOCIATES, Name, PersonInput, Plan, SectionKind, Subject};
use crate::numerology::{Calculator, CoreNumberSet};
use crate::utils::error::{AppResult, InputError};

/// Validate associates for `plan`. A solo plan ignores any associates given.
pub fn expand_associates(plan: Plan, associates: &[PersonInput]) -> AppResult<Vec<Subject>> {
    match plan {
        Plan::Solo => Ok(Vec::new()),
        Plan::WithAssociates => {
            if associates.is_empty() {
                return Err(InputError::MissingAssociates.into());
            }
            if associates.len() > MAX_ASSOCIATES {
                return Err(InputError::TooManyAssociates {
                    count: associates.len(),
                    max: MAX_ASSOCIATES,
                }
                .into());
            }
            associates
                .iter()
                .zip(1u8..)
                .map(|(person, index)| {
                    Ok(Subject::associate(
                        Name::parse(&person.name)?,
                        BirthDate::parse(&person.birth_date)?,
                        index,
                    ))
                })
                .collect()
        }
    }
}

/// Each associate with its numbers, in ascending index order.
pub fn compute_pairs(calculator: &Calculator, associates: Vec<Subject>) -> Vec<(Subject, CoreNumberSet)> {
    let mut pairs: Vec<_> = associates
        .into_iter()
        .map(|subject| {
            let numbers = calculator.compute(&subject);
            (subject, numbers)
        })
        .collect();
    pairs.sort_by_key(|(subject, _)| subject.associate_index());
    pairs
}

pub fn relationship_kind(associate: &Subject) -> Option<SectionKind> {
    associate.associate_index().map(SectionKind::Relationship)
}
