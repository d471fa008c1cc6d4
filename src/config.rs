use crate::numerology::letters::LetterTable;
use crate::rules::RuleSet;
use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Language the generated sections are written in
    pub language: String,
    /// Rule set file; the built-in rules are used when unset
    #[serde(default)]
    pub rules_file: Option<PathBuf>,
    /// Letter table file; the Pythagorean A-Z table is used when unset
    #[serde(default)]
    pub letter_table: Option<PathBuf>,
    #[serde(default = "default_concurrency")]
    pub max_concurrent_sections: usize,
    #[serde(default = "default_true")]
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    /// HTTP timeout of a single backend call
    pub timeout_secs: u64,
    /// Connection-level attempts made by the backend client itself
    pub retry_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Regenerations allowed per section after the first attempt
    pub max_retries: u32,
    /// Upper bound on one section call, including backend retries
    pub section_timeout_secs: u64,
}

fn default_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: "Japanese".to_string(),
            rules_file: None,
            letter_table: None,
            max_concurrent_sections: default_concurrency(),
            color: true,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            max_tokens: 8192,
            timeout_secs: 120,
            retry_count: 3,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            section_timeout_secs: 180,
        }
    }
}

impl PipelineConfig {
    pub fn section_timeout(&self) -> Duration {
        Duration::from_secs(self.section_timeout_secs)
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        Self::load_custom(&Self::config_file_path())
    }

    pub fn ensure_config_exists() -> AppResult<()> {
        let config_path = Self::config_file_path();
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save()?;
        }
        Ok(())
    }

    pub fn load_custom(config_path: &std::path::Path) -> AppResult<Self> {
        if !config_path.exists() {
            warn!(path = %config_path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|e| AppError::Io(e.to_string()))?;

        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.general.language.trim().is_empty() {
            return Err(AppError::Config("Language cannot be empty".to_string()));
        }

        if self.general.max_concurrent_sections == 0 {
            return Err(AppError::Config(
                "max_concurrent_sections must be at least 1".to_string(),
            ));
        }

        if self.generator.endpoint.trim().is_empty() {
            return Err(AppError::Config("Generator endpoint cannot be empty".to_string()));
        }

        if self.generator.model.trim().is_empty() {
            return Err(AppError::Config("Generator model cannot be empty".to_string()));
        }

        if self.generator.timeout_secs == 0 || self.pipeline.section_timeout_secs == 0 {
            return Err(AppError::Config("Timeouts must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Configured rule set, or the built-in one.
    pub fn load_rules(&self) -> AppResult<RuleSet> {
        match &self.general.rules_file {
            Some(path) => RuleSet::load(path),
            None => RuleSet::builtin(),
        }
    }

    /// Configured letter table, or the default.
    pub fn load_letter_table(&self) -> AppResult<LetterTable> {
        match &self.general.letter_table {
            Some(path) => LetterTable::load(path),
            None => Ok(LetterTable::default()),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Io(e.to_string()))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, content).map_err(|e| AppError::Io(e.to_string()))?;

        Ok(())
    }

    pub fn config_file_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("numerograph")
            .join("config.toml")
    }
}
