//! Nine-year personal cycle.

use super::reduce::reduce_for_cycle;
use serde::{Deserialize, Serialize};

/// Years shown when no explicit window is requested: the reference year and three on each side.
pub const DEFAULT_WINDOW: u32 = 7;

/// Longest window a caller may ask for.
pub const MAX_WINDOW: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleYear {
    pub year: i32,
    pub personal_year: u32,
    pub meaning: &'static str,
}

pub fn meaning(personal_year: u32) -> &'static str {
    match personal_year {
        1 => "beginning",
        2 => "balance",
        3 => "action",
        4 => "stability",
        5 => "change",
        6 => "harmony",
        7 => "reflection",
        8 => "achievement",
        9 => "completion",
        _ => "",
    }
}

/// Digit sum of a year where an adjacent "11" or "22" counts as one part,
/// e.g. 2011 is 2+0+11 and 2022 is 2+0+22, reduced for the cycle.
pub fn year_digit_sum(year: i32) -> u32 {
    let digits: Vec<u32> = year
        .unsigned_abs()
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    let mut total = 0;
    let mut i = 0;
    while i < digits.len() {
        if i + 1 < digits.len() && digits[i] == digits[i + 1] && (digits[i] == 1 || digits[i] == 2) {
            total += digits[i] * 11;
            i += 2;
        } else {
            total += digits[i];
            i += 1;
        }
    }
    reduce_for_cycle(total)
}

/// Birth number I collapsed to a single digit for cycle arithmetic.
pub fn birth_base(birth_i: Option<u32>) -> u32 {
    birth_i.map(reduce_for_cycle).unwrap_or(1)
}

pub fn personal_year(birth_i: Option<u32>, target_year: i32) -> u32 {
    reduce_for_cycle(year_digit_sum(target_year) + birth_base(birth_i))
}

/// Personal years for `length` consecutive years starting at `start_year`.
/// The window ends early rather than run past the last representable year.
pub fn nine_year_cycle(birth_i: Option<u32>, start_year: i32, length: u32) -> Vec<CycleYear> {
    (0..length)
        .map_while(|offset| {
            let year = start_year.checked_add(i32::try_from(offset).ok()?)?;
            let personal_year = personal_year(birth_i, year);
            Some(CycleYear {
                year,
                personal_year,
                meaning: meaning(personal_year),
            })
        })
        .collect()
}

/// The default window centred on `reference_year`.
pub fn centered_cycle(birth_i: Option<u32>, reference_year: i32) -> Vec<CycleYear> {
    nine_year_cycle(birth_i, window_start(reference_year, DEFAULT_WINDOW), DEFAULT_WINDOW)
}

/// First year of a `length`-year window with `center` in the middle.
pub fn window_start(center: i32, length: u32) -> i32 {
    let half = i32::try_from(length / 2).unwrap_or(i32::MAX);
    center.saturating_sub(half)
}
