//! Self-learning loop
//!
//! Per role: collect self-learning examples, curate a blended dataset
//! version, retrain, evaluate, and either deploy the candidate or roll back.
//! Every failure returns the role to `Idle` except a dataset integrity
//! violation, which halts the role until an operator clears it. The deployed
//! model stays active until a candidate has been fully evaluated.

use crate::config::LearningParams;
use crate::ports::evaluation_harness::{EvaluationError, EvaluationHarness, EvaluationRequest};
use crate::ports::event_sink::{EngineEvent, EngineEventSink, NoEventSink};
use crate::ports::feedback_channel::{
    FeedbackChannelError, MentorFeedbackChannel, NoMentorFeedback,
};
use crate::ports::judgment_provider::DomainJudgmentProvider;
use crate::ports::store::{PersistentStore, StoreError};
use crate::ports::training_pipeline::{TrainingJobError, TrainingJobRequest, TrainingPipeline};
use crate::registry::{AdapterFusionRegistry, LearningLedger, RegistryError};
use crate::use_cases::shared::{answer_situation, await_training, response_text};
use boardroom_domain::{
    AdapterFusionConfig, DatasetVersion, DomainError, EvaluationSample, EvaluationScore,
    LearningPhase, MentorFeedback, ModelVersion, NewExample, RoleId, SituationGenerator,
    TrainingExample, plan_blend,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors that can end a learning cycle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LearningCycleError {
    #[error("Learning halted: {0}")]
    DatasetIntegrity(DomainError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    TrainingJob(#[from] TrainingJobError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("No new self-learning examples for {0} since the last curation")]
    NothingNew(RoleId),

    #[error("Role {0} is already {1}")]
    RoleBusy(RoleId, LearningPhase),

    #[error("Role {0} is being upgraded to a new capacity tier")]
    UpgradeInProgress(RoleId),

    #[error("Learning for {0} is halted until an operator clears it")]
    Halted(RoleId),

    #[error("Role {0} is not part of the learning ledger")]
    UnknownRole(RoleId),
}

impl LearningCycleError {
    /// Governance violations require an operator before learning may resume
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, LearningCycleError::DatasetIntegrity(_))
    }
}

/// How an evaluated cycle ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CycleOutcome {
    Deployed {
        model_version: ModelVersion,
        previous_version: ModelVersion,
    },
    /// Candidate scored below the deployed model; nothing changed
    RolledBack {
        rejected_version: ModelVersion,
        active_version: ModelVersion,
    },
}

impl CycleOutcome {
    pub fn is_deployed(&self) -> bool {
        matches!(self, CycleOutcome::Deployed { .. })
    }
}

/// Result of one completed cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub role_id: RoleId,
    pub dataset_version: DatasetVersion,
    pub outcome: CycleOutcome,
    pub candidate: EvaluationScore,
    pub baseline: EvaluationScore,
}

/// Curated material handed from the locked phase to the async phases
struct Curated {
    version: DatasetVersion,
    examples: Vec<TrainingExample>,
    self_learning_count: usize,
}

pub struct SelfLearningLoop<P, T, E>
where
    P: DomainJudgmentProvider + 'static,
    T: TrainingPipeline + 'static,
    E: EvaluationHarness + 'static,
{
    provider: Arc<P>,
    pipeline: Arc<T>,
    harness: Arc<E>,
    ledger: Arc<LearningLedger>,
    registry: Arc<AdapterFusionRegistry>,
    store: Arc<dyn PersistentStore>,
    events: Arc<dyn EngineEventSink>,
    feedback: Arc<dyn MentorFeedbackChannel>,
    params: LearningParams,
    generator: Mutex<SituationGenerator>,
    started_at: Instant,
}

impl<P, T, E> SelfLearningLoop<P, T, E>
where
    P: DomainJudgmentProvider + 'static,
    T: TrainingPipeline + 'static,
    E: EvaluationHarness + 'static,
{
    pub fn new(
        provider: Arc<P>,
        pipeline: Arc<T>,
        harness: Arc<E>,
        ledger: Arc<LearningLedger>,
        registry: Arc<AdapterFusionRegistry>,
        store: Arc<dyn PersistentStore>,
        params: LearningParams,
    ) -> Self {
        Self {
            provider,
            pipeline,
            harness,
            ledger,
            registry,
            store,
            events: Arc::new(NoEventSink),
            feedback: Arc::new(NoMentorFeedback),
            params,
            generator: Mutex::new(SituationGenerator::new()),
            started_at: Instant::now(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_event_sink(mut self, events: Arc<dyn EngineEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_feedback_channel(mut self, feedback: Arc<dyn MentorFeedbackChannel>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn params(&self) -> &LearningParams {
        &self.params
    }

    // ==================== Collecting ====================

    /// Append one self-learning example for a role
    pub async fn collect(
        &self,
        role: &RoleId,
        example: NewExample,
    ) -> Result<TrainingExample, LearningCycleError> {
        let entry = self
            .ledger
            .append_self_learning(role, example)
            .ok_or_else(|| LearningCycleError::UnknownRole(role.clone()))?;
        if let Err(e) = self.store.append_examples(std::slice::from_ref(&entry)).await {
            warn!("Could not persist example {}: {}", entry.id, e);
        }
        Ok(entry)
    }

    /// Queue mentor feedback for the next curation; returns items no role owns
    pub fn receive_feedback(&self, batch: Vec<MentorFeedback>) -> Vec<MentorFeedback> {
        let received = batch.len();
        let unknown = self.ledger.route_feedback(batch);
        if !unknown.is_empty() {
            warn!(
                "{} of {} feedback items reference unknown responses",
                unknown.len(),
                received
            );
        }
        unknown
    }

    /// Pull everything waiting on the mentor feedback channel
    pub async fn drain_feedback(&self) -> Result<usize, FeedbackChannelError> {
        let batch = self.feedback.drain().await?;
        let received = batch.len();
        if received > 0 {
            debug!("Drained {} mentor feedback items", received);
            self.receive_feedback(batch);
        }
        Ok(received)
    }

    /// Answer `count` generated situations on the role's active adapter and
    /// collect the answers as unlabeled examples.
    ///
    /// Situations the provider fails to answer are skipped.
    pub async fn generate_situations(
        &self,
        role: &RoleId,
        count: usize,
    ) -> Result<Vec<TrainingExample>, LearningCycleError> {
        if !self.ledger.contains(role) {
            return Err(LearningCycleError::UnknownRole(role.clone()));
        }
        let adapter = self.active_adapter(role);
        let situations = self
            .generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate(&[], count);

        let mut collected = Vec::new();
        for situation in &situations {
            match answer_situation(
                self.provider.as_ref(),
                &adapter,
                situation,
                self.params.situation_timeout,
            )
            .await
            {
                Ok(judgment) => {
                    let example =
                        NewExample::new(situation.situation_text(), response_text(&judgment));
                    if let Some(entry) = self.ledger.append_self_learning(role, example) {
                        collected.push(entry);
                    }
                }
                Err(e) => warn!("{} could not answer {}: {}", role, situation.situation_id, e),
            }
        }

        if !collected.is_empty()
            && let Err(e) = self.store.append_examples(&collected).await
        {
            warn!("Could not persist generated examples for {}: {}", role, e);
        }
        info!(
            "Collected {}/{} generated situations for {}",
            collected.len(),
            situations.len(),
            role
        );
        Ok(collected)
    }

    // ==================== Cycle ====================

    /// Whether curation is due on growth or elapsed time
    pub fn should_curate(&self, role: &RoleId) -> bool {
        let now = Instant::now();
        self.ledger
            .with_role(role, |state| {
                let phase = state.lifecycle.phase();
                if phase.is_busy() || phase == LearningPhase::Halted || state.upgrading {
                    return false;
                }
                let new_examples = state.new_examples();
                if new_examples == 0 && state.pending_feedback.is_empty() {
                    return false;
                }
                let since = state.last_curated_at.unwrap_or(self.started_at);
                new_examples >= self.params.min_new_examples
                    || now.duration_since(since) >= self.params.curate_interval
            })
            .unwrap_or(false)
    }

    /// Run one full cycle for a role
    pub async fn run_cycle(&self, role: &RoleId) -> Result<CycleReport, LearningCycleError> {
        let curated = match self.curate(role) {
            Ok(curated) => curated,
            Err(e) => {
                if let LearningCycleError::DatasetIntegrity(DomainError::DatasetIntegrity {
                    example_id,
                    reason,
                }) = &e
                {
                    error!("Halting learning for {}: {}", role, e);
                    self.events.emit(&EngineEvent::IntegrityViolation {
                        role_id: role.clone(),
                        example_id: example_id.clone(),
                        reason: reason.clone(),
                    });
                }
                return Err(e);
            }
        };
        info!(
            "Curated dataset {} for {}: {} original + {} self-learning (ratio {:.2})",
            curated.version.version_id,
            role,
            curated.version.original_count,
            curated.version.self_learning_count,
            curated.version.blend_ratio.original_share()
        );

        match self.train_and_evaluate(role, curated).await {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!("Learning cycle for {} failed: {}", role, e);
                self.fail(role, &e);
                Err(e)
            }
        }
    }

    /// Operator acknowledgement of a halted role
    pub fn clear_halt(&self, role: &RoleId) -> Result<(), LearningCycleError> {
        self.ledger
            .with_role(role, |state| state.lifecycle.clear_halt())
            .ok_or_else(|| LearningCycleError::UnknownRole(role.clone()))?
            .map_err(LearningCycleError::from)?;
        info!("Halt cleared for {}", role);
        Ok(())
    }

    /// Run a cycle for every role whose curation is due, concurrently
    pub async fn curate_due(&self) -> Vec<(RoleId, Result<CycleReport, LearningCycleError>)> {
        let due: Vec<RoleId> = self
            .ledger
            .roles()
            .into_iter()
            .filter(|role| self.should_curate(role))
            .collect();

        futures::future::join_all(due.into_iter().map(|role| async move {
            let result = self.run_cycle(&role).await;
            (role, result)
        }))
        .await
    }

    /// One pass of the background loop
    pub async fn tick(&self) -> Vec<(RoleId, Result<CycleReport, LearningCycleError>)> {
        if let Err(e) = self.drain_feedback().await {
            warn!("Mentor feedback unavailable: {}", e);
        }
        if self.params.generated_situations > 0 {
            for role in self.ledger.roles() {
                let busy = self
                    .ledger
                    .with_role(&role, |s| s.lifecycle.phase().is_busy())
                    .unwrap_or(true);
                if !busy
                    && let Err(e) = self
                        .generate_situations(&role, self.params.generated_situations)
                        .await
                {
                    warn!("Situation generation for {} failed: {}", role, e);
                }
            }
        }
        self.curate_due().await
    }

    /// Run the loop in the background until `token` is cancelled
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.params.background_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                "Self-learning loop started (every {:?})",
                self.params.background_interval
            );

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        info!("Self-learning loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        for (role, result) in self.tick().await {
                            match result {
                                Ok(report) => debug!("{}: {:?}", role, report.outcome),
                                Err(LearningCycleError::NothingNew(_)) => {}
                                Err(e) => debug!("{}: {}", role, e),
                            }
                        }
                    }
                }
            }
        })
    }

    // ==================== Phases ====================

    /// Snapshot, verify and blend under the role's lock.
    ///
    /// The dataset version is only drafted here; it is recorded once persisted.
    fn curate(&self, role: &RoleId) -> Result<Curated, LearningCycleError> {
        let target = self.params.target_blend_ratio;
        self.ledger
            .with_role(role, |state| -> Result<Curated, LearningCycleError> {
                match state.lifecycle.phase() {
                    LearningPhase::Halted => return Err(LearningCycleError::Halted(role.clone())),
                    phase if phase.is_busy() => {
                        return Err(LearningCycleError::RoleBusy(role.clone(), phase));
                    }
                    _ => {}
                }
                if state.upgrading {
                    return Err(LearningCycleError::UpgradeInProgress(role.clone()));
                }
                state.lifecycle.resume_collecting()?;
                state.lifecycle.transition(LearningPhase::Curating)?;

                if let Err(e) = state.corpus.verify_original_integrity() {
                    state.lifecycle.halt(e.to_string())?;
                    return Err(LearningCycleError::DatasetIntegrity(e));
                }

                let pending = std::mem::take(&mut state.pending_feedback);
                match state.corpus.apply_feedback(&pending) {
                    Ok((appended, unknown)) => {
                        if !appended.is_empty() {
                            debug!("Applied {} mentor labels for {}", appended.len(), role);
                        }
                        if !unknown.is_empty() {
                            warn!("Dropped {} feedback items for {}", unknown.len(), role);
                        }
                    }
                    Err(e) => {
                        state.lifecycle.halt(e.to_string())?;
                        return Err(LearningCycleError::DatasetIntegrity(e));
                    }
                }

                if state.new_examples() == 0 {
                    state.lifecycle.transition(LearningPhase::Idle)?;
                    return Err(LearningCycleError::NothingNew(role.clone()));
                }

                let boundary = state.corpus.snapshot();
                let eligible = state.corpus.eligible_self_learning(&boundary).len();
                let plan = match plan_blend(boundary.original_count, eligible, target) {
                    Ok(plan) => plan,
                    Err(e) => {
                        state.lifecycle.fail(e.to_string())?;
                        return Err(e.into());
                    }
                };

                let examples = state.corpus.blend(&boundary, &plan);
                let version = state.versions.draft(role.clone(), boundary, plan);

                Ok(Curated {
                    version,
                    examples,
                    self_learning_count: boundary.self_learning_count,
                })
            })
            .unwrap_or_else(|| Err(LearningCycleError::UnknownRole(role.clone())))
    }

    async fn train_and_evaluate(
        &self,
        role: &RoleId,
        curated: Curated,
    ) -> Result<CycleReport, LearningCycleError> {
        self.store.save_dataset_version(&curated.version).await?;
        self.commit_curation(role, &curated)?;
        let active = self.active_adapter(role);

        // Retraining
        self.transition(role, LearningPhase::Retraining)?;
        let job = self
            .pipeline
            .submit(TrainingJobRequest {
                role_id: role.clone(),
                capacity_tier: active.capacity_tier,
                base_model: active.active_model_version.clone(),
                dataset_version: curated.version.version_id,
                examples: curated.examples,
            })
            .await?;
        info!("Submitted training job {} for {}", job, role);
        let candidate_version = await_training(
            self.pipeline.as_ref(),
            &job,
            self.params.training_poll_interval,
            self.params.training_timeout,
        )
        .await?;

        // Evaluating
        self.transition(role, LearningPhase::Evaluating)?;
        let candidate = self.evaluate(&active, candidate_version.clone()).await?;
        let deployed = self
            .ledger
            .with_role(role, |state| state.deployed_evaluation.clone())
            .flatten();
        let baseline = match deployed {
            Some(score) if score.model_version == active.active_model_version => score,
            _ => self.evaluate(&active, active.active_model_version.clone()).await?,
        };
        if let Err(e) = self.store.save_evaluation(&candidate).await {
            warn!("Could not persist evaluation of {}: {}", candidate_version, e);
        }

        let outcome = if candidate.regresses_from(&baseline, self.params.regression_tolerance) {
            info!(
                "Candidate {} for {} regressed ({:.3} < {:.3}); keeping {}",
                candidate_version, role, candidate.overall, baseline.overall, active.active_model_version
            );
            self.transition(role, LearningPhase::RolledBack)?;
            self.events.emit(&EngineEvent::ModelRolledBack {
                role_id: role.clone(),
                rejected_version: candidate_version.clone(),
                active_version: active.active_model_version.clone(),
                reason: format!(
                    "overall {:.3} below deployed {:.3}",
                    candidate.overall, baseline.overall
                ),
            });
            CycleOutcome::RolledBack {
                rejected_version: candidate_version,
                active_version: active.active_model_version.clone(),
            }
        } else {
            let deployed = self.registry.deploy_from(
                role,
                &active.active_model_version,
                active.capacity_tier,
                candidate_version.clone(),
            )?;
            if let Err(e) = self.store.save_fusion_config(&deployed).await {
                warn!("Could not persist fusion config for {}: {}", role, e);
            }
            let score = candidate.clone();
            self.ledger
                .with_role(role, |state| state.deployed_evaluation = Some(score));
            self.transition(role, LearningPhase::Deployed)?;
            self.events.emit(&EngineEvent::ModelDeployed {
                role_id: role.clone(),
                capacity_tier: deployed.capacity_tier,
                model_version: candidate_version.clone(),
                previous_version: active.active_model_version.clone(),
                dataset_version: Some(curated.version.version_id),
                overall: candidate.overall,
            });
            CycleOutcome::Deployed {
                model_version: candidate_version,
                previous_version: active.active_model_version.clone(),
            }
        };

        let sample = EvaluationSample {
            score: candidate.clone(),
            self_learning_count: curated.self_learning_count,
        };
        self.ledger
            .with_role(role, |state| state.evaluations.push(sample));

        Ok(CycleReport {
            role_id: role.clone(),
            dataset_version: curated.version,
            outcome,
            candidate,
            baseline,
        })
    }

    /// Record a persisted dataset version and mark its examples as used
    fn commit_curation(&self, role: &RoleId, curated: &Curated) -> Result<(), LearningCycleError> {
        self.ledger
            .with_role(role, |state| {
                if !state.versions.commit(curated.version.clone()) {
                    return Err(LearningCycleError::RoleBusy(role.clone(), state.lifecycle.phase()));
                }
                state.curated_through = curated.self_learning_count;
                state.last_curated_at = Some(Instant::now());
                Ok(())
            })
            .unwrap_or_else(|| Err(LearningCycleError::UnknownRole(role.clone())))
    }

    async fn evaluate(
        &self,
        active: &AdapterFusionConfig,
        model_version: ModelVersion,
    ) -> Result<EvaluationScore, EvaluationError> {
        self.harness
            .evaluate(&EvaluationRequest {
                role_id: active.role_id.clone(),
                model_version,
                capacity_tier: active.capacity_tier,
                probes: Vec::new(),
            })
            .await
    }

    fn active_adapter(&self, role: &RoleId) -> AdapterFusionConfig {
        self.registry
            .get(role)
            .map(|config| config.as_ref().clone())
            .unwrap_or_else(|| AdapterFusionConfig::baseline(role.clone()))
    }

    fn transition(&self, role: &RoleId, next: LearningPhase) -> Result<(), LearningCycleError> {
        self.ledger
            .with_role(role, |state| state.lifecycle.transition(next))
            .ok_or_else(|| LearningCycleError::UnknownRole(role.clone()))?
            .map_err(LearningCycleError::from)
    }

    /// Return an in-flight role to Idle with the fault recorded
    fn fail(&self, role: &RoleId, fault: &LearningCycleError) {
        self.ledger.with_role(role, |state| {
            if state.lifecycle.phase().is_busy()
                && let Err(e) = state.lifecycle.fail(fault.to_string())
            {
                warn!("Could not reset {}: {}", role, e);
            }
        });
    }
}
