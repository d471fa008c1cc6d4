use crate::cli::CheckArgs;
use crate::config::Config;
use crate::rules::RuleSet;
use crate::rules::validator::{ValidationResult, validate};
use crate::utils::{OutputStyle, print_success};
use anyhow::{Context, Result, bail};

pub fn handle_check_command(config: Config, args: &CheckArgs) -> Result<()> {
    let rules = match &args.rules {
        Some(path) => RuleSet::load(path)?,
        None => config.load_rules()?,
    };
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    match validate(&text, &rules) {
        ValidationResult::Ok => {
            print_success(&format!(
                "{} passes all {} content rules",
                args.file.display(),
                rules.pattern_count()
            ));
            Ok(())
        }
        ValidationResult::Violated(ids) => {
            println!("🚫 {}", OutputStyle::error(&format!("{} violates the content rules:", args.file.display())));
            let descriptions = rules.describe(&ids);
            for id in &ids {
                println!("  {}", OutputStyle::warning(id));
            }
            for description in descriptions {
                println!("    {}", OutputStyle::muted(description));
            }
            bail!("{} rule violation(s) found", ids.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(text: &str) -> (tempfile::NamedTempFile, CheckArgs) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", text).unwrap();
        let args = CheckArgs {
            file: file.path().to_path_buf(),
            rules: None,
        };
        (file, args)
    }

    #[test]
    fn test_clean_file_passes() {
        let (_file, args) = args_for("落ち着いた判断力が強みです。");
        assert!(handle_check_command(Config::default(), &args).is_ok());
    }

    #[test]
    fn test_violating_file_fails() {
        let (_file, args) = args_for("今年のらっきーあいてむは傘です。");
        let err = handle_check_command(Config::default(), &args).unwrap_err();
        assert!(err.to_string().contains("violation"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let args = CheckArgs {
            file: "/nonexistent/section.txt".into(),
            rules: None,
        };
        let err = handle_check_command(Config::default(), &args).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/section.txt"));
    }
}
