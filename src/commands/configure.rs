use crate::config::Config;
use crate::cli::ConfigCommands;
use crate::utils::{self, OutputStyle};
use anyhow::Result;

pub fn handle_config_command(
    mut config: Config,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) => handle_show_command(&config),
        Some(ConfigCommands::Reset { force }) => handle_reset_command(&mut config, force),
        None => handle_config_help(),
    }
}

fn handle_show_command(config: &Config) -> Result<()> {
    OutputStyle::print_header("⚙️  Numerograph Configuration");

    println!("General:");
    println!("  Language: {}", config.general.language);
    match &config.general.rules_file {
        Some(path) => println!("  Rules file: {}", path.display()),
        None => println!("  Rules file: (built-in)"),
    }
    match &config.general.letter_table {
        Some(path) => println!("  Letter table: {}", path.display()),
        None => println!("  Letter table: (Pythagorean A-Z)"),
    }
    println!("  Concurrent sections: {}", config.general.max_concurrent_sections);
    println!("  Color: {}", config.general.color);

    println!("Generator:");
    println!("  Endpoint: {}", config.generator.endpoint);
    println!("  Model: {}", config.generator.model);
    if config.generator.api_key.is_some() {
        println!("  API key: ✓");
    }
    println!("  Max tokens: {}", config.generator.max_tokens);
    println!("  Timeout: {}s", config.generator.timeout_secs);
    println!("  Connection retries: {}", config.generator.retry_count);

    println!("Pipeline:");
    println!("  Max retries: {}", config.pipeline.max_retries);
    println!("  Section timeout: {}s", config.pipeline.section_timeout_secs);

    let rules = config.load_rules()?;
    println!("Rules:");
    println!("  Design principles: {}", rules.design_principles().len());
    println!("  Prohibited patterns: {}", rules.pattern_count());

    Ok(())
}

fn handle_config_help() -> Result<()> {
    OutputStyle::print_header("⚙️  Configuration Management");
    println!("Available configuration commands:");
    println!("  numerograph config show    - Show current configuration");
    println!("  numerograph config reset   - Reset configuration to defaults");
    println!();
    println!("Configuration file location: {}", Config::config_file_path().display());
    Ok(())
}

fn handle_reset_command(config: &mut Config, force: bool) -> Result<()> {
    if force || utils::prompt_yes_no("Are you sure you want to reset configuration to defaults? This will overwrite your current settings.")? {
        *config = Config::default();
        config.save()?;
        utils::print_success("Configuration reset to defaults!");
    } else {
        println!("Reset cancelled.");
    }
    Ok(())
}
