use clap::{Parser, Subcommand, Args};
use std::path::PathBuf;
use anyhow::Result;
use crate::config::Config;
use crate::commands::{generate, numbers, cycle, check, configure};

#[derive(Parser)]
#[command(name = "numerograph")]
#[command(about = "Numerology profiles with rule-checked generated sections")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable debug logging (RUST_LOG overrides)")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Commands {
    pub async fn execute(self, config: Config) -> Result<()> {
        match self {
            Commands::Generate(args) => {
                generate::handle_generate_command(config, &args).await?;
            }
            Commands::Numbers(args) => {
                numbers::handle_numbers_command(config, &args)?;
            }
            Commands::Cycle(args) => {
                cycle::handle_cycle_command(config, &args)?;
            }
            Commands::Check(args) => {
                check::handle_check_command(config, &args)?;
            }
            Commands::Config(args) => {
                configure::handle_config_command(config, args.command.clone())?;
            }
        }
        Ok(())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a profile from a request file
    Generate(GenerateArgs),

    /// Show a subject's core numbers
    Numbers(NumbersArgs),

    /// Show the personal-year cycle for a birth date
    Cycle(CycleArgs),

    /// Check a text file against the content rules
    Check(CheckArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    #[arg(help = "Request file (.toml or .json)")]
    pub request: PathBuf,

    #[arg(long, help = "Use the built-in offline generator instead of the configured backend")]
    pub offline: bool,

    #[arg(long, help = "Print the assembled prompts without generating")]
    pub dry_run: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(short, long, value_name = "FILE", help = "Write the rendered profile to a file")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Reference year for the personal cycle (defaults to the current year)")]
    pub year: Option<i32>,
}

#[derive(Args)]
pub struct NumbersArgs {
    #[arg(help = "Name, family name first")]
    pub name: String,

    #[arg(help = "Birth date, e.g. 1990/05/17")]
    pub birth_date: String,

    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CycleArgs {
    #[arg(help = "Birth date, e.g. 1990/05/17")]
    pub birth_date: String,

    #[arg(long, help = "First year shown (defaults to three years before the current one)")]
    pub from: Option<i32>,

    #[arg(
        long,
        default_value_t = crate::numerology::cycle::DEFAULT_WINDOW,
        value_parser = clap::value_parser!(u32).range(1..=crate::numerology::cycle::MAX_WINDOW as i64),
        help = "Number of years shown"
    )]
    pub years: u32,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(help = "Text file to check")]
    pub file: PathBuf,

    #[arg(long, help = "Rule file to use instead of the configured one")]
    pub rules: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommands>,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset {
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "numerograph",
            "generate",
            "request.toml",
            "--offline",
            "--format",
            "json",
            "-o",
            "out.json",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.request, PathBuf::from("request.toml"));
                assert!(args.offline);
                assert!(!args.dry_run);
                assert_eq!(args.format, OutputFormat::Json);
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
                assert!(args.year.is_none());
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_cycle_defaults() {
        let cli = Cli::try_parse_from(["numerograph", "-d", "cycle", "1990/05/17"]).unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Cycle(args) => {
                assert_eq!(args.birth_date, "1990/05/17");
                assert!(args.from.is_none());
                assert_eq!(args.years, 7);
            }
            _ => panic!("expected cycle"),
        }
    }

    #[test]
    fn test_cycle_years_bounded() {
        for bad in ["0", "101", "4294967295"] {
            let parsed = Cli::try_parse_from(["numerograph", "cycle", "1990/05/17", "--years", bad]);
            assert!(parsed.is_err(), "accepted --years {}", bad);
        }
        let cli = Cli::try_parse_from(["numerograph", "cycle", "1990/05/17", "--years", "100"]).unwrap();
        assert!(matches!(cli.command, Commands::Cycle(args) if args.years == 100));
    }

    #[test]
    fn test_config_reset_force() {
        let cli = Cli::try_parse_from(["numerograph", "config", "reset", "--force"]).unwrap();
        match cli.command {
            Commands::Config(args) => {
                assert!(matches!(args.command, Some(ConfigCommands::Reset { force: true })));
            }
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["numerograph", "generate", "r.toml", "--format", "pdf"]).is_err());
    }
}
