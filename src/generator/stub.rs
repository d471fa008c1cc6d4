//! Deterministic offline generator.
//!
//! Returns fixed text keyed by section kind. Individual kinds can be made to
//! hang (so the caller's timeout fires), fail, or return prohibited text for
//! a number of attempts; every call is counted per kind.

use super::{GenerationError, Generator};
use crate::core::data::SectionKind;
use crate::prompt::GenerationRequest;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct StubGenerator {
    hanging: HashSet<SectionKind>,
    failing: HashSet<SectionKind>,
    tainted: HashMap<SectionKind, (String, u32)>,
    delays: HashMap<SectionKind, Duration>,
    calls: Mutex<HashMap<SectionKind, u32>>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never answer for `kind`.
    pub fn hang_on(mut self, kind: SectionKind) -> Self {
        self.hanging.insert(kind);
        self
    }

    /// Report the backend as unavailable for `kind`.
    pub fn fail_on(mut self, kind: SectionKind) -> Self {
        self.failing.insert(kind);
        self
    }

    /// Return `text` for the first `times` calls for `kind`; `u32::MAX` means always.
    pub fn taint(mut self, kind: SectionKind, text: impl Into<String>, times: u32) -> Self {
        self.tainted.insert(kind, (text.into(), times));
        self
    }

    /// Delay the answer for `kind`, to reorder completions.
    pub fn delay(mut self, kind: SectionKind, by: Duration) -> Self {
        self.delays.insert(kind, by);
        self
    }

    pub fn calls(&self, kind: SectionKind) -> u32 {
        self.calls
            .lock()
            .map(|calls| calls.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().map(|calls| calls.values().sum()).unwrap_or(0)
    }

    pub fn canned_text(kind: SectionKind) -> String {
        match kind {
            SectionKind::Overview => {
                "This reading describes a steady temperament that grows through small, deliberate steps.".to_string()
            }
            SectionKind::Breakdown(category) => format!(
                "{} ({}) shows a tendency the person can draw on consciously in work and daily life.",
                category.label(),
                category.native_label()
            ),
            SectionKind::Relationship(index) => format!(
                "With person {}, shared rhythms support cooperation while differences invite clear agreements.",
                index
            ),
        }
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let kind = request.kind;
        let call = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| GenerationError::Unavailable("stub call counter poisoned".to_string()))?;
            let count = calls.entry(kind).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(delay) = self.delays.get(&kind) {
            tokio::time::sleep(*delay).await;
        }
        if self.hanging.contains(&kind) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&kind) {
            return Err(GenerationError::Unavailable(format!("stub refuses {}", kind)));
        }
        if let Some((text, times)) = self.tainted.get(&kind)
            && call <= *times
        {
            return Ok(text.clone());
        }
        Ok(Self::canned_text(kind))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerology::Category;

    fn request(kind: SectionKind) -> GenerationRequest {
        GenerationRequest {
            kind,
            system: String::new(),
            user: String::new(),
            max_tokens: 16,
        }
    }

    #[tokio::test]
    async fn test_canned_text_keyed_by_kind() {
        let stub = StubGenerator::new();
        let overview = stub.generate(&request(SectionKind::Overview)).await.unwrap();
        let breakdown = stub.generate(&request(SectionKind::Breakdown(Category::Soul))).await.unwrap();
        assert_ne!(overview, breakdown);
        assert!(breakdown.contains("Soul Number"));
        assert_eq!(stub.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_taint_then_recover() {
        let stub = StubGenerator::new().taint(SectionKind::Overview, "bad", 1);
        assert_eq!(stub.generate(&request(SectionKind::Overview)).await.unwrap(), "bad");
        assert_eq!(
            stub.generate(&request(SectionKind::Overview)).await.unwrap(),
            StubGenerator::canned_text(SectionKind::Overview)
        );
        assert_eq!(stub.calls(SectionKind::Overview), 2);
    }

    #[tokio::test]
    async fn test_fail_on() {
        let stub = StubGenerator::new().fail_on(SectionKind::Relationship(2));
        let err = stub.generate(&request(SectionKind::Relationship(2))).await.unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }
}
