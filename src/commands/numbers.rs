use crate::cli::NumbersArgs;
use crate::config::Config;
use crate::core::data::{BirthDate, Name, Subject};
use crate::numerology::{Calculator, CoreNumberSet};
use crate::utils::OutputStyle;
use anyhow::{Context, Result};
use chrono::Datelike;
use std::sync::Arc;

pub fn handle_numbers_command(config: Config, args: &NumbersArgs) -> Result<()> {
    let (subject, numbers) = compute_numbers(&config, args)?;

    if args.json {
        let json = serde_json::to_string_pretty(&numbers).context("Failed to serialize numbers")?;
        println!("{}", json);
    } else {
        OutputStyle::print_numbers(&subject, &numbers);
    }
    Ok(())
}

fn compute_numbers(config: &Config, args: &NumbersArgs) -> Result<(Subject, CoreNumberSet)> {
    let table = config.load_letter_table()?;
    let year = args.year.unwrap_or_else(|| chrono::Local::now().year());
    let calculator = Calculator::new(Arc::new(table), year);

    let subject = Subject::primary(Name::parse(&args.name)?, BirthDate::parse(&args.birth_date)?);
    let numbers = calculator.compute(&subject);
    Ok((subject, numbers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerology::Category;
    use crate::utils::error::AppError;

    fn args(name: &str, birth_date: &str) -> NumbersArgs {
        NumbersArgs {
            name: name.to_string(),
            birth_date: birth_date.to_string(),
            year: Some(2026),
            json: true,
        }
    }

    #[test]
    fn test_compute_numbers_from_args() {
        let (subject, numbers) = compute_numbers(&Config::default(), &args("tanaka taro", "1990-05-17")).unwrap();
        assert_eq!(subject.name.full(), "TANAKA TARO");
        assert_eq!(numbers.get(Category::BirthI), Some(5));
        assert_eq!(numbers.get(Category::PersonalYear), Some(6));
    }

    #[test]
    fn test_invalid_date_is_input_error() {
        let err = compute_numbers(&Config::default(), &args("TANAKA TARO", "1990/02/31")).unwrap_err();
        let app = err.downcast_ref::<AppError>().unwrap();
        assert!(app.is_client_error());
    }
}
