use crate::utils::output::OutputStyle;
use std::time::Duration;
use thiserror::Error;

/// Rejected request input. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("name is empty")]
    EmptyName,

    #[error("invalid birth date '{0}': expected YYYY/MM/DD between 1900 and 2100")]
    InvalidBirthDate(String),

    #[error("too many associates: {count} (maximum {max})")]
    TooManyAssociates { count: usize, max: usize },

    #[error("plan 'withAssociates' requires at least one associate")]
    MissingAssociates,
}

#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("Generation backend unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Profile generation cancelled")]
    Cancelled,
}

impl AppError {
    /// True when the caller supplied bad input, as opposed to a server-side fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }
}

/// Result type alias for consistent error handling across the application
pub type AppResult<T> = Result<T, AppError>;

pub fn report_error(err: &AppError) {
    match err {
        AppError::InvalidInput(e) => {
            eprintln!("⚠️  {}", OutputStyle::warning(&format!("Input: {}", e)));
        }
        AppError::Config(msg) => {
            eprintln!("❌ {}", OutputStyle::error(&format!("Config: {}", msg)));
        }
        AppError::GenerationTimeout(_) | AppError::GenerationUnavailable(_) | AppError::Network(_) => {
            eprintln!("🌐 {}", OutputStyle::error(&err.to_string()));
        }
        AppError::Io(e) => {
            eprintln!("❌ {}", OutputStyle::error(e));
        }
        AppError::Cancelled => {
            eprintln!("⏹️  {}", OutputStyle::muted(&err.to_string()));
        }
    }
}
