//! Hand-written port mocks shared by the use case tests.

use crate::ports::evaluation_harness::{EvaluationError, EvaluationHarness, EvaluationRequest};
use crate::ports::event_sink::{EngineEvent, EngineEventSink};
use crate::ports::judgment_provider::{
    DomainJudgmentProvider, Judgment, JudgmentError, JudgmentRequest,
};
use crate::ports::store::{PersistentStore, StoreError};
use crate::ports::training_pipeline::{
    TrainingJobError, TrainingJobId, TrainingJobRequest, TrainingJobStatus, TrainingPipeline,
};
use async_trait::async_trait;
use boardroom_domain::{
    AdapterFusionConfig, DatasetVersion, DecisionId, DecisionOutcome, EvaluationScore,
    ModelVersion, RoleId, TrainingExample,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

// ==================== Judgment Provider ====================

/// One scripted provider response
#[derive(Debug, Clone)]
pub enum Step {
    Answer(Judgment),
    Fail(String),
    /// Sleep, then answer with the score
    Delay(Duration, f64),
    Panic,
}

impl Step {
    pub fn score(score: f64) -> Self {
        Step::Answer(Judgment::new(score, format!("scored {:.2}", score)).with_confidence(0.8))
    }
}

/// Provider replaying a per-role script; the last step repeats
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<RoleId, VecDeque<Step>>>,
    calls: Mutex<HashMap<RoleId, usize>>,
    models: Mutex<HashMap<RoleId, ModelVersion>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, role: RoleId, steps: Vec<Step>) -> Self {
        self.scripts.lock().unwrap().insert(role, steps.into());
        self
    }

    pub fn calls(&self, role: &RoleId) -> usize {
        self.calls.lock().unwrap().get(role).copied().unwrap_or(0)
    }

    pub fn last_model(&self, role: &RoleId) -> Option<ModelVersion> {
        self.models.lock().unwrap().get(role).cloned()
    }

    fn next_step(&self, role: &RoleId) -> Option<Step> {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.get_mut(role)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl DomainJudgmentProvider for ScriptedProvider {
    async fn evaluate(&self, request: &JudgmentRequest) -> Result<Judgment, JudgmentError> {
        *self.calls.lock().unwrap().entry(request.role_id.clone()).or_default() += 1;
        self.models.lock().unwrap().insert(
            request.role_id.clone(),
            request.adapter.active_model_version.clone(),
        );

        match self.next_step(&request.role_id) {
            Some(Step::Answer(judgment)) => Ok(judgment),
            Some(Step::Fail(message)) => Err(JudgmentError::Unavailable(message)),
            Some(Step::Delay(delay, score)) => {
                tokio::time::sleep(delay).await;
                Ok(Judgment::new(score, "late answer"))
            }
            Some(Step::Panic) => panic!("scripted provider panic for {}", request.role_id),
            None => Err(JudgmentError::Unavailable("no script".to_string())),
        }
    }
}

// ==================== Persistent Store ====================

#[derive(Default)]
pub struct MemoryStore {
    pub outcomes: Mutex<HashMap<DecisionId, DecisionOutcome>>,
    pub examples: Mutex<Vec<TrainingExample>>,
    pub versions: Mutex<Vec<DatasetVersion>>,
    pub evaluations: Mutex<Vec<EvaluationScore>>,
    pub configs: Mutex<Vec<AdapterFusionConfig>>,
    pub unavailable: AtomicBool,
    outcome_delay: Mutex<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `save_outcome` sleep before writing
    pub fn set_outcome_delay(&self, delay: Duration) {
        *self.outcome_delay.lock().unwrap() = delay;
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn save_outcome(&self, outcome: &DecisionOutcome) -> Result<(), StoreError> {
        let delay = *self.outcome_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        self.outcomes
            .lock()
            .unwrap()
            .entry(outcome.decision_id().clone())
            .or_insert_with(|| outcome.clone());
        Ok(())
    }

    async fn load_outcome(&self, id: &DecisionId) -> Result<Option<DecisionOutcome>, StoreError> {
        self.check()?;
        Ok(self.outcomes.lock().unwrap().get(id).cloned())
    }

    async fn append_examples(&self, examples: &[TrainingExample]) -> Result<(), StoreError> {
        self.check()?;
        self.examples.lock().unwrap().extend_from_slice(examples);
        Ok(())
    }

    async fn save_dataset_version(&self, version: &DatasetVersion) -> Result<(), StoreError> {
        self.check()?;
        self.versions.lock().unwrap().push(version.clone());
        Ok(())
    }

    async fn save_evaluation(&self, score: &EvaluationScore) -> Result<(), StoreError> {
        self.check()?;
        self.evaluations.lock().unwrap().push(score.clone());
        Ok(())
    }

    async fn save_fusion_config(&self, config: &AdapterFusionConfig) -> Result<(), StoreError> {
        self.check()?;
        self.configs.lock().unwrap().push(config.clone());
        Ok(())
    }
}

// ==================== Event Sink ====================

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(EngineEvent::event_type).collect()
    }
}

impl EngineEventSink for RecordingSink {
    fn emit(&self, event: &EngineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ==================== Training Pipeline ====================

#[derive(Debug, Clone)]
pub enum PipelineBehavior {
    /// Complete after this many `Running` polls
    CompleteAfter(usize),
    /// Report a failed job on first poll
    Fail(String),
    /// Refuse the submission
    Reject(String),
    /// Stay `Running` forever
    Hang,
}

pub struct ScriptedPipeline {
    behavior: Mutex<PipelineBehavior>,
    polls: AtomicUsize,
    jobs: AtomicUsize,
    pub submitted: Mutex<Vec<TrainingJobRequest>>,
}

impl ScriptedPipeline {
    pub fn new(behavior: PipelineBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            polls: AtomicUsize::new(0),
            jobs: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: PipelineBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn jobs(&self) -> usize {
        self.jobs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrainingPipeline for ScriptedPipeline {
    async fn submit(&self, request: TrainingJobRequest) -> Result<TrainingJobId, TrainingJobError> {
        if let PipelineBehavior::Reject(reason) = &*self.behavior.lock().unwrap() {
            return Err(TrainingJobError::Rejected(reason.clone()));
        }
        let n = self.jobs.fetch_add(1, Ordering::SeqCst) + 1;
        self.polls.store(0, Ordering::SeqCst);
        let id = TrainingJobId(format!(
            "{}-{}-v{}",
            request.role_id, request.capacity_tier, n
        ));
        self.submitted.lock().unwrap().push(request);
        Ok(id)
    }

    async fn poll(&self, job: &TrainingJobId) -> Result<TrainingJobStatus, TrainingJobError> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst);
        match &*self.behavior.lock().unwrap() {
            PipelineBehavior::CompleteAfter(n) if polls >= *n => {
                Ok(TrainingJobStatus::Completed(ModelVersion::new(job.0.clone())))
            }
            PipelineBehavior::CompleteAfter(_) | PipelineBehavior::Hang => {
                Ok(TrainingJobStatus::Running)
            }
            PipelineBehavior::Fail(reason) => Ok(TrainingJobStatus::Failed(reason.clone())),
            PipelineBehavior::Reject(reason) => Err(TrainingJobError::UnknownJob(reason.clone())),
        }
    }
}

// ==================== Evaluation Harness ====================

/// (fidelity, clarity, conflict, guardrail)
pub type Metrics = (f64, f64, f64, f64);

pub struct ScriptedHarness {
    default: Metrics,
    by_version: Mutex<HashMap<String, Metrics>>,
    pub unavailable: AtomicBool,
    pub requests: Mutex<Vec<EvaluationRequest>>,
}

impl ScriptedHarness {
    pub fn new(default: Metrics) -> Self {
        Self {
            default,
            by_version: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with(self, version: &str, metrics: Metrics) -> Self {
        self.by_version
            .lock()
            .unwrap()
            .insert(version.to_string(), metrics);
        self
    }

    pub fn set(&self, version: &str, metrics: Metrics) {
        self.by_version
            .lock()
            .unwrap()
            .insert(version.to_string(), metrics);
    }
}

#[async_trait]
impl EvaluationHarness for ScriptedHarness {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationScore, EvaluationError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EvaluationError::Unavailable("harness offline".to_string()));
        }
        self.requests.lock().unwrap().push(request.clone());
        let (f, c, k, g) = self
            .by_version
            .lock()
            .unwrap()
            .get(request.model_version.as_str())
            .copied()
            .unwrap_or(self.default);
        Ok(EvaluationScore::new(
            request.role_id.clone(),
            request.model_version.clone(),
            f,
            c,
            k,
            g,
        ))
    }
}
