//! Core trait definitions for profile generation
//!
//! These traits mark the two seams of the pipeline: the external text
//! generator, and the strategies used to detect prohibited content.

use crate::generator::GenerationError;
use crate::prompt::GenerationRequest;
use async_trait::async_trait;

/// External language-generation backend
///
/// Implementations receive a fully assembled request and return raw text.
/// They may apply their own connection-level retries; per-section timeouts
/// and validation retries are enforced by the caller.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for one section
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Prohibited-content matcher
///
/// Each configured prohibited pattern compiles to one matcher. New kinds of
/// prohibition are added as new implementations.
pub trait PatternMatcher: Send + Sync + std::fmt::Debug {
    /// Identifier reported when the pattern is found
    fn id(&self) -> &str;

    /// Human-readable reason, used when asking the generator to rewrite
    fn description(&self) -> &str;

    /// Whether `text` contains the pattern
    fn is_match(&self, text: &str) -> bool;
}
