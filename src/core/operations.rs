//! Profile orchestration
//!
//! Sequences core-number computation, prompt assembly, generation,
//! validation and assembly of the final section list. The generator calls
//! are the only side effects; sections are generated concurrently within a
//! bounded window and joined in canonical order before the profile is
//! returned.

use crate::config::{Config, PipelineConfig};
use crate::core::data::{
    BirthDate, Name, Profile, ProfileRequest, ProfileState, Section, SectionKind, SectionStatus, Subject,
};
use crate::core::relationship::{compute_pairs, expand_associates, relationship_kind};
use crate::core::traits::Generator;
use crate::generator::GenerationError;
use crate::numerology::cycle::{self, CycleYear};
use crate::numerology::{Calculator, Category, CoreNumberSet};
use crate::prompt::{GenerationRequest, PromptAssembler, PromptInput};
use crate::rules::RuleSet;
use crate::rules::validator::{EMPTY_TEXT, ValidationResult, validate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::format::strip_markdown;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Cooperative cancellation shared between a request and its caller.
///
/// Cancelling stops new generation attempts; calls already in flight run to
/// completion or time out.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-section retry bound and call timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Regenerations after the first attempt
    pub max_retries: u32,
    pub section_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        PipelineConfig::default().into()
    }
}

impl From<PipelineConfig> for RetryPolicy {
    fn from(config: PipelineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            section_timeout: config.section_timeout(),
        }
    }
}

/// One section waiting to be generated.
#[derive(Debug, Clone)]
struct SectionJob {
    kind: SectionKind,
    subjects: Vec<Subject>,
    request: GenerationRequest,
}

/// Subjects, numbers and section jobs derived from a request before any generation.
struct Prepared {
    primary: Subject,
    primary_numbers: CoreNumberSet,
    maiden: Option<(Subject, CoreNumberSet)>,
    associates: Vec<(Subject, CoreNumberSet)>,
    jobs: Vec<SectionJob>,
}

enum SectionOutcome {
    /// The section plus the last backend error seen while producing it.
    Finished(Section, Option<GenerationError>),
    Cancelled(SectionKind),
}

pub struct ProfileOrchestrator {
    calculator: Calculator,
    rules: Arc<RuleSet>,
    generator: Arc<dyn Generator>,
    assembler: PromptAssembler,
    policy: RetryPolicy,
    concurrency: usize,
}

impl ProfileOrchestrator {
    pub fn new(
        calculator: Calculator,
        rules: Arc<RuleSet>,
        generator: Arc<dyn Generator>,
        assembler: PromptAssembler,
    ) -> Self {
        Self {
            calculator,
            rules,
            generator,
            assembler,
            policy: RetryPolicy::default(),
            concurrency: 1,
        }
    }

    /// Build from configuration; loads the rule set and letter table once.
    pub fn from_config(config: &Config, generator: Arc<dyn Generator>, reference_year: i32) -> AppResult<Self> {
        let rules = Arc::new(config.load_rules()?);
        let table = Arc::new(config.load_letter_table()?);
        let assembler = PromptAssembler::new(config.general.language.clone(), config.generator.max_tokens);

        Ok(Self::new(Calculator::new(table, reference_year), rules, generator, assembler)
            .with_policy(config.pipeline.clone().into())
            .with_concurrency(config.general.max_concurrent_sections))
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Assembled requests for every section, in canonical order, without generating anything.
    pub fn plan(&self, request: &ProfileRequest) -> AppResult<Vec<GenerationRequest>> {
        Ok(self.prepare(request)?.jobs.into_iter().map(|job| job.request).collect())
    }

    pub async fn generate_profile(&self, request: &ProfileRequest, cancel: &CancelToken) -> AppResult<Profile> {
        self.run(Uuid::new_v4(), request, cancel).await
    }

    #[instrument(name = "profile", skip_all, fields(profile_id = %id))]
    async fn run(&self, id: Uuid, request: &ProfileRequest, cancel: &CancelToken) -> AppResult<Profile> {
        let mut states = vec![ProfileState::Init];

        enter(&mut states, ProfileState::ComputingCore);
        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(err) => return Err(fail(&mut states, err)),
        };
        info!(
            associates = prepared.associates.len(),
            sections = prepared.jobs.len(),
            generator = self.generator.name(),
            "core numbers computed"
        );

        enter(&mut states, ProfileState::GeneratingPrimarySections);
        let relationships_started = AtomicBool::new(false);

        // `buffered` yields in submission order, whatever order calls complete in.
        let outcomes: Vec<SectionOutcome> = stream::iter(prepared.jobs)
            .map(|job| self.run_section(job, cancel, &relationships_started))
            .buffered(self.concurrency)
            .collect()
            .await;

        if relationships_started.load(Ordering::SeqCst) {
            enter(&mut states, ProfileState::GeneratingRelationshipSection);
        }

        let mut sections = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        let mut cancelled = false;
        for outcome in outcomes {
            match outcome {
                SectionOutcome::Finished(section, error) => {
                    sections.push(section);
                    errors.extend(error);
                }
                SectionOutcome::Cancelled(kind) => {
                    debug!(section = %kind, "section abandoned after cancellation");
                    cancelled = true;
                }
            }
        }

        if cancelled {
            return Err(fail(&mut states, AppError::Cancelled));
        }

        if let Some(err) = total_outage(&sections, errors) {
            return Err(fail(&mut states, err.into()));
        }

        sections.sort_by_key(|section| section.kind);
        enter(&mut states, ProfileState::Assembled);

        let unverified = sections.iter().filter(|s| !s.is_verified()).count();
        if unverified > 0 {
            warn!(unverified, "profile assembled with unverified sections");
        }
        enter(&mut states, ProfileState::Done);

        Ok(Profile {
            id,
            primary: prepared.primary,
            primary_numbers: prepared.primary_numbers,
            maiden: prepared.maiden,
            associates: prepared.associates,
            sections,
            states,
        })
    }

    fn prepare(&self, request: &ProfileRequest) -> AppResult<Prepared> {
        let primary = Subject::primary(
            Name::parse(&request.primary.name)?,
            BirthDate::parse(&request.primary.birth_date)?,
        );
        let associates = expand_associates(request.plan, &request.associates)?;

        let primary_numbers = self.calculator.compute(&primary);
        let maiden = match request.maiden_name.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(family) => {
                let name = primary.name.with_family(family)?;
                // Same family name: nothing to compare.
                (name != primary.name).then(|| {
                    let subject = Subject::primary(name, primary.birth_date);
                    let numbers = self.calculator.compute(&subject);
                    (subject, numbers)
                })
            }
            None => None,
        };
        let associates = compute_pairs(&self.calculator, associates);
        let cycle: Vec<CycleYear> =
            cycle::centered_cycle(primary_numbers.get(Category::BirthI), self.calculator.reference_year());

        let principles = self.rules.design_principles();
        let base = PromptInput {
            primary: &primary,
            primary_numbers: &primary_numbers,
            associate: None,
            maiden: maiden.as_ref().map(|(subject, numbers)| (subject, numbers)),
            cycle: &cycle,
            consultation: request.consultation.as_deref(),
        };

        let mut jobs: Vec<SectionJob> = SectionKind::primary_kinds()
            .into_iter()
            .map(|kind| SectionJob {
                kind,
                subjects: vec![primary.clone()],
                request: self.assembler.build_prompt(kind, &base, principles),
            })
            .collect();

        for (associate, numbers) in &associates {
            let Some(kind) = relationship_kind(associate) else {
                continue;
            };
            let input = PromptInput {
                associate: Some((associate, numbers)),
                maiden: None,
                ..base
            };
            jobs.push(SectionJob {
                kind,
                subjects: vec![primary.clone(), associate.clone()],
                request: self.assembler.build_prompt(kind, &input, principles),
            });
        }

        Ok(Prepared {
            primary,
            primary_numbers,
            maiden,
            associates,
            jobs,
        })
    }

    /// Generate and validate one section, regenerating on violation or
    /// backend failure up to the retry bound. Never fails: exhausted sections
    /// come back unverified with the best text seen.
    async fn run_section(
        &self,
        job: SectionJob,
        cancel: &CancelToken,
        relationships_started: &AtomicBool,
    ) -> SectionOutcome {
        let max_attempts = self.policy.max_retries + 1;
        let mut request = job.request.clone();
        let mut best: Option<(String, Vec<String>)> = None;
        let mut last_error: Option<GenerationError> = None;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return SectionOutcome::Cancelled(job.kind);
            }
            if job.kind.is_relationship() && !relationships_started.swap(true, Ordering::SeqCst) {
                debug!(section = %job.kind, "first relationship section dispatched");
            }

            let result = tokio::time::timeout(self.policy.section_timeout, self.generator.generate(&request))
                .await
                .unwrap_or(Err(GenerationError::Timeout(self.policy.section_timeout)));

            match result {
                Ok(raw) => {
                    let text = strip_markdown(&raw).trim().to_string();
                    match validate(&text, &self.rules) {
                        ValidationResult::Ok => {
                            debug!(section = %job.kind, attempt, "section verified");
                            let section = Section {
                                kind: job.kind,
                                subjects: job.subjects,
                                text,
                                status: SectionStatus::Verified,
                                attempts: attempt,
                                violations: Vec::new(),
                                failure: None,
                            };
                            return SectionOutcome::Finished(section, None);
                        }
                        ValidationResult::Violated(ids) => {
                            warn!(section = %job.kind, attempt, violations = ?ids, "generated text violates rules");
                            request = job.request.with_feedback(&self.problem_descriptions(&ids));
                            let is_better = best.as_ref().is_none_or(|(_, v)| ids.len() <= v.len());
                            if text.is_empty() {
                                last_error = Some(GenerationError::Unavailable("generator returned no text".to_string()));
                            } else if is_better {
                                best = Some((text, ids.into_iter().collect()));
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(section = %job.kind, attempt, error = %err, "generation attempt failed");
                    last_error = Some(err);
                }
            }
        }

        warn!(section = %job.kind, attempts = max_attempts, "retries exhausted, section left unverified");
        let (text, violations, failure) = match best {
            Some((text, violations)) => (text, violations, None),
            None => (String::new(), Vec::new(), last_error.as_ref().map(ToString::to_string)),
        };
        let section = Section {
            kind: job.kind,
            subjects: job.subjects,
            text,
            status: SectionStatus::Unverified,
            attempts: max_attempts,
            violations,
            failure,
        };
        SectionOutcome::Finished(section, last_error)
    }

    fn problem_descriptions(&self, ids: &BTreeSet<String>) -> Vec<&str> {
        let mut problems = self.rules.describe(ids);
        if ids.contains(EMPTY_TEXT) {
            problems.push("an empty response");
        }
        problems
    }
}

fn enter(states: &mut Vec<ProfileState>, state: ProfileState) {
    debug!(?state, "profile state");
    states.push(state);
}

fn fail(states: &mut Vec<ProfileState>, err: AppError) -> AppError {
    warn!(error = %err, "profile failed");
    enter(states, ProfileState::Failed);
    err
}

/// Error to fail the whole profile with when no section obtained any text
/// because the backend never answered.
fn total_outage(sections: &[Section], errors: Vec<GenerationError>) -> Option<GenerationError> {
    if sections.is_empty() || sections.iter().any(|s| !s.text.is_empty()) {
        return None;
    }
    errors.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::{PersonInput, Plan};
    use crate::generator::stub::StubGenerator;
    use crate::numerology::letters::LetterTable;
    use crate::utils::error::InputError;

    fn orchestrator(stub: Arc<StubGenerator>) -> ProfileOrchestrator {
        ProfileOrchestrator::new(
            Calculator::new(Arc::new(LetterTable::default()), 2026),
            Arc::new(RuleSet::builtin().unwrap()),
            stub,
            PromptAssembler::new("Japanese", 2048),
        )
        .with_policy(RetryPolicy {
            max_retries: 2,
            section_timeout: Duration::from_secs(30),
        })
        .with_concurrency(4)
    }

    fn person(name: &str, birth_date: &str) -> PersonInput {
        PersonInput {
            name: name.to_string(),
            birth_date: birth_date.to_string(),
        }
    }

    fn request(plan: Plan, associates: usize) -> ProfileRequest {
        ProfileRequest {
            primary: person("TANAKA TARO", "1990/05/17"),
            associates: (0..associates)
                .map(|i| person(&format!("ASSOCIATE PERSON{}", i), &format!("1985/03/{:02}", i + 1)))
                .collect(),
            plan,
            consultation: None,
            maiden_name: None,
        }
    }

    #[tokio::test]
    async fn test_solo_profile_end_to_end() {
        let stub = Arc::new(StubGenerator::new());
        let orch = orchestrator(stub.clone());
        let req = ProfileRequest {
            primary: person("田中太郎", "1990-05-17"),
            ..request(Plan::Solo, 0)
        };

        let profile = orch.generate_profile(&req, &CancelToken::new()).await.unwrap();

        let kinds: Vec<_> = profile.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SectionKind::primary_kinds());
        assert_eq!(profile.relationship_sections().count(), 0);
        assert!(profile.sections.iter().all(|s| s.is_verified() && !s.text.is_empty() && s.attempts == 1));
        assert_eq!(profile.states.first(), Some(&ProfileState::Init));
        assert_eq!(profile.states.last(), Some(&ProfileState::Done));
        assert!(!profile.states.contains(&ProfileState::GeneratingRelationshipSection));
        assert_eq!(stub.total_calls() as usize, kinds.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ordering_independent_of_completion() {
        let stub = StubGenerator::new()
            .delay(SectionKind::Relationship(1), Duration::from_secs(5))
            .delay(SectionKind::Relationship(2), Duration::from_secs(3))
            .delay(SectionKind::Overview, Duration::from_secs(4));
        let orch = orchestrator(Arc::new(stub)).with_concurrency(32);

        let profile = orch
            .generate_profile(&request(Plan::WithAssociates, 3), &CancelToken::new())
            .await
            .unwrap();

        let primary_count = SectionKind::primary_kinds().len();
        assert_eq!(profile.sections.len(), primary_count + 3);
        assert!(profile.sections[..primary_count].iter().all(|s| !s.kind.is_relationship()));
        let relationship: Vec<_> = profile.relationship_sections().map(|s| s.kind).collect();
        assert_eq!(
            relationship,
            vec![
                SectionKind::Relationship(1),
                SectionKind::Relationship(2),
                SectionKind::Relationship(3)
            ]
        );
        assert_eq!(profile.sections[0].kind, SectionKind::Overview);
        assert_eq!(profile.sections[primary_count].subjects.len(), 2);
        assert!(profile.states.contains(&ProfileState::GeneratingRelationshipSection));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades_single_section() {
        let hung = SectionKind::Breakdown(Category::Soul);
        let stub = Arc::new(StubGenerator::new().hang_on(hung));
        let orch = orchestrator(stub.clone());

        let profile = orch
            .generate_profile(&request(Plan::WithAssociates, 2), &CancelToken::new())
            .await
            .unwrap();

        let unverified: Vec<_> = profile.unverified_sections().collect();
        assert_eq!(unverified.len(), 1);
        assert_eq!(unverified[0].kind, hung);
        assert_eq!(unverified[0].attempts, 3);
        assert!(unverified[0].failure.as_deref().is_some_and(|f| f.contains("timed out")));
        assert_eq!(stub.calls(hung), 3);

        assert_eq!(profile.sections.len(), SectionKind::primary_kinds().len() + 2);
        assert!(
            profile
                .sections
                .iter()
                .filter(|s| s.kind != hung)
                .all(|s| s.is_verified() && !s.text.is_empty())
        );
    }

    #[tokio::test]
    async fn test_violation_regenerates_then_passes() {
        let kind = SectionKind::Breakdown(Category::Mission);
        let stub = Arc::new(StubGenerator::new().taint(kind, "今年のラッキーアイテムは赤い傘です。", 1));
        let orch = orchestrator(stub.clone());

        let profile = orch.generate_profile(&request(Plan::Solo, 0), &CancelToken::new()).await.unwrap();

        let section = profile.sections.iter().find(|s| s.kind == kind).unwrap();
        assert!(section.is_verified());
        assert_eq!(section.attempts, 2);
        assert_eq!(stub.calls(kind), 2);
    }

    #[tokio::test]
    async fn test_unresolved_violation_included_flagged() {
        let kind = SectionKind::Overview;
        let tainted = "Your lucky item is a blue pen, and you will do well.";
        let stub = Arc::new(StubGenerator::new().taint(kind, tainted, u32::MAX));
        let orch = orchestrator(stub.clone());

        let profile = orch.generate_profile(&request(Plan::Solo, 0), &CancelToken::new()).await.unwrap();

        let section = &profile.sections[0];
        assert_eq!(section.kind, kind);
        assert_eq!(section.status, SectionStatus::Unverified);
        assert_eq!(section.text, tainted);
        assert_eq!(section.violations, vec!["lucky-items-en".to_string()]);
        assert_eq!(section.attempts, orch.policy().max_retries + 1);
        assert_eq!(profile.unverified_sections().count(), 1);
    }

    #[tokio::test]
    async fn test_markdown_stripped_before_validation() {
        let kind = SectionKind::Breakdown(Category::Core);
        let stub = Arc::new(StubGenerator::new().taint(kind, "## Core\n**Steady** focus.", u32::MAX));
        let orch = orchestrator(stub);

        let profile = orch.generate_profile(&request(Plan::Solo, 0), &CancelToken::new()).await.unwrap();
        let section = profile.sections.iter().find(|s| s.kind == kind).unwrap();
        assert_eq!(section.text, "Core\nSteady focus.");
        assert!(section.is_verified());
    }

    #[tokio::test]
    async fn test_associate_bounds_enforced() {
        let orch = orchestrator(Arc::new(StubGenerator::new()));
        let cancel = CancelToken::new();

        let err = orch
            .generate_profile(&request(Plan::WithAssociates, 11), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(InputError::TooManyAssociates { .. })));

        let err = orch
            .generate_profile(&request(Plan::WithAssociates, 0), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_client_error());

        let profile = orch
            .generate_profile(&request(Plan::WithAssociates, 10), &cancel)
            .await
            .unwrap();
        assert_eq!(profile.relationship_sections().count(), 10);
    }

    #[tokio::test]
    async fn test_solo_plan_ignores_associates() {
        let stub = Arc::new(StubGenerator::new());
        let orch = orchestrator(stub.clone());
        let profile = orch.generate_profile(&request(Plan::Solo, 4), &CancelToken::new()).await.unwrap();
        assert_eq!(profile.relationship_sections().count(), 0);
        assert!(profile.associates.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_primary_rejected_without_generation() {
        let stub = Arc::new(StubGenerator::new());
        let orch = orchestrator(stub.clone());
        let req = ProfileRequest {
            primary: person("  ", "1990/05/17"),
            ..request(Plan::Solo, 0)
        };
        let err = orch.generate_profile(&req, &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(InputError::EmptyName)));
        assert_eq!(stub.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_total_outage_fails_profile() {
        let mut stub = StubGenerator::new();
        for kind in SectionKind::primary_kinds() {
            stub = stub.fail_on(kind);
        }
        let orch = orchestrator(Arc::new(stub));
        let err = orch
            .generate_profile(&request(Plan::Solo, 0), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GenerationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_single_backend_failure_is_isolated() {
        let kind = SectionKind::Relationship(1);
        let stub = Arc::new(StubGenerator::new().fail_on(kind));
        let orch = orchestrator(stub);
        let profile = orch
            .generate_profile(&request(Plan::WithAssociates, 2), &CancelToken::new())
            .await
            .unwrap();
        let failed = profile.sections.iter().find(|s| s.kind == kind).unwrap();
        assert_eq!(failed.status, SectionStatus::Unverified);
        assert!(failed.text.is_empty());
        assert!(failed.failure.is_some());
        assert_eq!(profile.unverified_sections().count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let stub = Arc::new(StubGenerator::new());
        let orch = orchestrator(stub.clone());
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = orch.generate_profile(&request(Plan::Solo, 0), &cancel).await.unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(stub.total_calls(), 0);
    }

    #[test]
    fn test_plan_lists_requests_in_canonical_order() {
        let orch = orchestrator(Arc::new(StubGenerator::new()));
        let requests = orch.plan(&request(Plan::WithAssociates, 2)).unwrap();
        let kinds: Vec<_> = requests.iter().map(|r| r.kind).collect();
        let mut expected = SectionKind::primary_kinds();
        expected.extend([SectionKind::Relationship(1), SectionKind::Relationship(2)]);
        assert_eq!(kinds, expected);
        let principle = &orch.rules().design_principles()[0];
        assert!(requests.iter().all(|r| r.system.contains(principle.as_str())));
    }

    #[tokio::test]
    async fn test_deterministic_numbers_across_runs() {
        let orch = orchestrator(Arc::new(StubGenerator::new()));
        let a = orch.generate_profile(&request(Plan::WithAssociates, 1), &CancelToken::new()).await.unwrap();
        let b = orch.generate_profile(&request(Plan::WithAssociates, 1), &CancelToken::new()).await.unwrap();
        assert_eq!(a.primary_numbers, b.primary_numbers);
        assert_eq!(a.associates, b.associates);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_flight_stops_pending_sections() {
        let overview = SectionKind::Overview;
        let first = SectionKind::Breakdown(Category::BirthI);
        let later = SectionKind::Breakdown(Category::BirthII);
        let stub = StubGenerator::new()
            .delay(overview, Duration::from_secs(10))
            .delay(first, Duration::from_secs(10))
            .taint(overview, "Your lucky item is a red scarf.", u32::MAX);
        let stub = Arc::new(stub);
        let orch = orchestrator(stub.clone()).with_concurrency(2);

        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        let result = orch.generate_profile(&request(Plan::Solo, 0), &cancel).await;
        trigger.await.unwrap();

        assert!(matches!(result, Err(AppError::Cancelled)));
        assert_eq!(stub.calls(overview), 1);
        assert_eq!(stub.calls(first), 1);
        assert_eq!(stub.calls(later), 0);
        assert_eq!(stub.total_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_section_timing_out_fails_with_timeout() {
        let mut stub = StubGenerator::new();
        for kind in SectionKind::primary_kinds() {
            stub = stub.hang_on(kind);
        }
        let orch = orchestrator(Arc::new(stub));
        let err = orch
            .generate_profile(&request(Plan::Solo, 0), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GenerationTimeout(after) if after == Duration::from_secs(30)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_relationship_state_recorded_after_primary() {
        let orch = orchestrator(Arc::new(StubGenerator::new()));
        let profile = orch
            .generate_profile(&request(Plan::WithAssociates, 1), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(
            profile.states,
            vec![
                ProfileState::Init,
                ProfileState::ComputingCore,
                ProfileState::GeneratingPrimarySections,
                ProfileState::GeneratingRelationshipSection,
                ProfileState::Assembled,
                ProfileState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_maiden_name_adds_second_reading() {
        let stub = Arc::new(StubGenerator::new());
        let orch = orchestrator(stub.clone());
        let req = ProfileRequest {
            maiden_name: Some("suzuki".to_string()),
            ..request(Plan::WithAssociates, 1)
        };

        let requests = orch.plan(&req).unwrap();
        assert!(requests[0].user.contains("Maiden name: SUZUKI TARO"));
        assert!(requests[1..].iter().all(|r| !r.user.contains("SUZUKI")));

        let profile = orch.generate_profile(&req, &CancelToken::new()).await.unwrap();
        let (maiden, numbers) = profile.maiden.as_ref().unwrap();
        assert_eq!(maiden.name.full(), "SUZUKI TARO");
        assert_eq!(maiden.birth_date, profile.primary.birth_date);
        assert_eq!(*numbers, orch.calculator.compute(maiden));
        assert_eq!(profile.sections.len(), SectionKind::primary_kinds().len() + 1);
    }

    #[test]
    fn test_maiden_name_matching_current_family_is_ignored() {
        let orch = orchestrator(Arc::new(StubGenerator::new()));
        for maiden in ["Tanaka", "  "] {
            let req = ProfileRequest {
                maiden_name: Some(maiden.to_string()),
                ..request(Plan::Solo, 0)
            };
            let requests = orch.plan(&req).unwrap();
            assert!(!requests[0].user.contains("Maiden name"));
        }
    }
}
