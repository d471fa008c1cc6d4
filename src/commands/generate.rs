use crate::cli::{GenerateArgs, OutputFormat};
use crate::config::Config;
use crate::core::data::{Profile, ProfileRequest};
use crate::core::operations::{CancelToken, ProfileOrchestrator};
use crate::core::traits::Generator;
use crate::generator::openai::OpenAiGenerator;
use crate::generator::stub::StubGenerator;
use crate::prompt::GenerationRequest;
use crate::utils::{OutputStyle, print_success, print_warning, render_plain};
use anyhow::{Context, Result};
use chrono::Datelike;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub async fn handle_generate_command(config: Config, args: &GenerateArgs) -> Result<()> {
    let request = load_request(&args.request)?;
    let year = args.year.unwrap_or_else(|| chrono::Local::now().year());

    let generator: Arc<dyn Generator> = if args.offline || args.dry_run {
        Arc::new(StubGenerator::new())
    } else {
        Arc::new(OpenAiGenerator::new(config.generator.clone()).context("Failed to set up the generator backend")?)
    };
    let orchestrator = ProfileOrchestrator::from_config(&config, generator, year)?;

    if args.dry_run {
        let requests = orchestrator.plan(&request)?;
        return print_plan(&requests, args.format);
    }

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let profile = orchestrator.generate_profile(&request, &cancel).await?;

    let rendered = render(&profile, args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write profile to {}", path.display()))?;
            OutputStyle::print_profile_summary(&profile);
            print_success(&format!("Profile written to {}", path.display()));
        }
        None => print!("{}", rendered),
    }

    let unverified = profile.unverified_sections().count();
    if unverified > 0 {
        print_warning(&format!("{} section(s) could not be verified against the content rules", unverified));
    }

    Ok(())
}

/// Read a profile request; `.json` files are parsed as JSON, anything else as TOML.
pub fn load_request(path: &Path) -> Result<ProfileRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let request = if is_json {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON request in {}", path.display()))?
    } else {
        toml::from_str(&content).with_context(|| format!("Invalid TOML request in {}", path.display()))?
    };
    Ok(request)
}

pub fn render(profile: &Profile, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_plain(profile)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(profile).context("Failed to serialize profile")?;
            json.push('\n');
            Ok(json)
        }
    }
}

fn print_plan(requests: &[GenerationRequest], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(requests).context("Failed to serialize prompts")?;
        println!("{}", json);
        return Ok(());
    }

    for (i, request) in requests.iter().enumerate() {
        OutputStyle::print_header(&format!("{}. {}", i + 1, request.kind));
        println!("{}", OutputStyle::muted(&request.system));
        println!("{}", OutputStyle::separator());
        println!("{}", OutputStyle::content(&request.user));
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::Plan;
    use std::io::Write;

    #[test]
    fn test_load_request_toml_and_json() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            toml_file,
            "plan = \"solo\"\nconsultation = \"Work\"\n[primary]\nname = \"TANAKA TARO\"\nbirth_date = \"1990/05/17\"\n"
        )
        .unwrap();
        let request = load_request(toml_file.path()).unwrap();
        assert_eq!(request.plan, Plan::Solo);
        assert_eq!(request.consultation.as_deref(), Some("Work"));

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            json_file,
            r#"{{"plan":"withAssociates","primary":{{"name":"A B","birth_date":"1990-01-01"}},"associates":[{{"name":"C D","birth_date":"1991-02-02"}}]}}"#
        )
        .unwrap();
        let request = load_request(json_file.path()).unwrap();
        assert_eq!(request.plan, Plan::WithAssociates);
        assert_eq!(request.associates.len(), 1);
    }

    #[test]
    fn test_demo_request_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/request.toml");
        let request = load_request(&path).unwrap();
        assert_eq!(request.plan, Plan::WithAssociates);
        assert_eq!(request.associates.len(), 2);
    }

    #[test]
    fn test_load_request_errors_carry_path() {
        let mut bad = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(bad, "primary = 3").unwrap();
        let err = load_request(bad.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML request"));
    }

    #[tokio::test]
    async fn test_offline_generate_writes_json() {
        let mut request_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(request_file, "[primary]\nname = \"TANAKA TARO\"\nbirth_date = \"1990/05/17\"\n").unwrap();
        let out = tempfile::NamedTempFile::new().unwrap();

        let args = GenerateArgs {
            request: request_file.path().to_path_buf(),
            offline: true,
            dry_run: false,
            format: OutputFormat::Json,
            output: Some(out.path().to_path_buf()),
            year: Some(2026),
        };
        handle_generate_command(Config::default(), &args).await.unwrap();

        let written: Profile = serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
        assert_eq!(written.primary.name.full(), "TANAKA TARO");
        assert_eq!(written.relationship_sections().count(), 0);
    }
}
