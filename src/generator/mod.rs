pub mod openai;
pub mod stub;

use crate::utils::error::AppError;
use std::time::Duration;
use thiserror::Error;

pub use crate::core::traits::Generator;

/// Failure of a single generation call. Both kinds are retryable per section.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Timeout(after) => AppError::GenerationTimeout(after),
            GenerationError::Unavailable(msg) => AppError::GenerationUnavailable(msg),
        }
    }
}

/// API key from the environment, checked in order of precedence.
pub fn get_api_key() -> Option<String> {
    ["NUMEROGRAPH_API_KEY", "OPENAI_API_KEY"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
}
