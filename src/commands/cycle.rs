use crate::cli::CycleArgs;
use crate::config::Config;
use crate::core::data::BirthDate;
use crate::numerology::Calculator;
use crate::numerology::cycle::{self, CycleYear};
use crate::utils::OutputStyle;
use anyhow::Result;
use chrono::Datelike;
use std::sync::Arc;

pub fn handle_cycle_command(config: Config, args: &CycleArgs) -> Result<()> {
    let current = chrono::Local::now().year();
    let years = cycle_for(&config, args, current)?;
    OutputStyle::print_cycle(&years, current);
    Ok(())
}

fn cycle_for(config: &Config, args: &CycleArgs, current: i32) -> Result<Vec<CycleYear>> {
    let date = BirthDate::parse(&args.birth_date)?;
    let calculator = Calculator::new(Arc::new(config.load_letter_table()?), current);
    let birth_i = calculator.birth_number(&date);

    let years = args.years.clamp(1, cycle::MAX_WINDOW);
    let start = args.from.unwrap_or_else(|| cycle::window_start(current, years));
    Ok(cycle::nine_year_cycle(birth_i, start, years))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_centred_on_current_year() {
        let args = CycleArgs {
            birth_date: "1990/05/17".to_string(),
            from: None,
            years: 7,
        };
        let years = cycle_for(&Config::default(), &args, 2026).unwrap();
        assert_eq!(years.len(), 7);
        assert_eq!(years[0].year, 2023);
        assert_eq!(years[3].year, 2026);
        // 2026 -> 1, BirthI 5 -> 6
        assert_eq!(years[3].personal_year, 6);
        assert_eq!(years[3].meaning, "harmony");
    }

    #[test]
    fn test_explicit_start() {
        let args = CycleArgs {
            birth_date: "1990/05/17".to_string(),
            from: Some(2030),
            years: 9,
        };
        let years = cycle_for(&Config::default(), &args, 2026).unwrap();
        assert_eq!(years.first().map(|y| y.year), Some(2030));
        assert_eq!(years.len(), 9);
    }

    #[test]
    fn test_window_clamped_and_bounded_at_year_limit() {
        let args = CycleArgs {
            birth_date: "1990/05/17".to_string(),
            from: Some(i32::MAX - 2),
            years: u32::MAX,
        };
        let years = cycle_for(&Config::default(), &args, 2026).unwrap();
        assert_eq!(years.len(), 3);
        assert_eq!(years.last().map(|y| y.year), Some(i32::MAX));

        let args = CycleArgs { from: None, years: u32::MAX, ..args };
        let years = cycle_for(&Config::default(), &args, 2026).unwrap();
        assert_eq!(years.len(), cycle::MAX_WINDOW as usize);
        assert_eq!(years[0].year, 2026 - 50);
    }
}
