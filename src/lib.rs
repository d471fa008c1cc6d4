//! Numerograph - numerology profiles with rule-constrained generated text
//!
//! This library computes core numbers from a subject's name and birth date,
//! assembles one generation request per profile section, validates the
//! generated text against a prohibited-content rule set, and returns the
//! sections in a stable order for document rendering.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod generator;
pub mod numerology;
pub mod prompt;
pub mod rules;
pub mod utils;

// Re-export core types and traits for easier use
pub use crate::core::{
    data::{BirthDate, Name, PersonInput, Plan, Profile, ProfileRequest, Section, SectionKind, Subject},
    operations::{CancelToken, ProfileOrchestrator, RetryPolicy},
    traits::{Generator, PatternMatcher},
};
pub use crate::numerology::{Calculator, Category, CoreNumberSet};
pub use crate::utils::error::{AppError, AppResult, InputError};

use chrono::Datelike;
use std::sync::Arc;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main library interface for external usage
pub struct Numerograph {
    orchestrator: ProfileOrchestrator,
}

impl Numerograph {
    /// Create an instance from configuration, using the current year for the personal cycle
    pub fn new(config: &config::Config, generator: Arc<dyn Generator>) -> AppResult<Self> {
        let year = chrono::Local::now().year();
        Ok(Self {
            orchestrator: ProfileOrchestrator::from_config(config, generator, year)?,
        })
    }

    pub async fn generate(&self, request: &ProfileRequest) -> AppResult<Profile> {
        self.orchestrator.generate_profile(request, &CancelToken::new()).await
    }

    /// Get the underlying orchestrator for direct access
    pub fn orchestrator(&self) -> &ProfileOrchestrator {
        &self.orchestrator
    }
}
