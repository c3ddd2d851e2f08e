//! Capacity Upgrade Manager
//!
//! Watches each role's evaluation history for sustained plateaus, retrains
//! roles against the next capacity tier from their latest dataset version,
//! and compares both tiers side by side before promoting. Corpora and
//! dataset versions are read, never written; demotion reverts the tier in
//! the registry. A role being upgraded is held in the learning ledger, so no
//! learning cycle can curate it until the upgrade settles.

use crate::config::{LearningParams, UpgradeParams};
use crate::ports::evaluation_harness::{EvaluationError, EvaluationHarness, EvaluationRequest};
use crate::ports::event_sink::{EngineEvent, EngineEventSink, NoEventSink};
use crate::ports::judgment_provider::DomainJudgmentProvider;
use crate::ports::store::PersistentStore;
use crate::ports::training_pipeline::{TrainingJobError, TrainingJobRequest, TrainingPipeline};
use crate::registry::{AdapterFusionRegistry, LearningLedger, RegistryError};
use crate::use_cases::shared::{answer_situation, await_training, response_text};
use boardroom_domain::{
    AdapterFusionConfig, CapacityTier, DatasetVersionId, DomainError, EvaluationScore,
    ExampleId, ExampleSource, FeedbackLabel, ModelVersion, Provenance, RoleId,
    SituationGenerator, TrainingExample, UpgradeTrigger, detect_triggers, mean_overall,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapacityUpgradeError {
    #[error("Role {0} is not registered")]
    UnknownRole(RoleId),

    #[error("Upgrade aborted: {0}")]
    DatasetIntegrity(DomainError),

    #[error(transparent)]
    TrainingJob(#[from] TrainingJobError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Per-role result of an upgrade run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RoleUpgradeOutcome {
    Promoted {
        from: CapacityTier,
        to: CapacityTier,
        model_version: ModelVersion,
        margin: f64,
    },
    /// The new tier did not lead by the promotion margin
    Retained {
        tier: CapacityTier,
        current_mean: f64,
        candidate_mean: f64,
    },
    Skipped {
        reason: String,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleUpgrade {
    pub role_id: RoleId,
    pub outcome: RoleUpgradeOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeReport {
    pub roles: Vec<RoleUpgrade>,
}

impl UpgradeReport {
    pub fn promoted(&self) -> impl Iterator<Item = &RoleUpgrade> {
        self.roles
            .iter()
            .filter(|r| matches!(r.outcome, RoleUpgradeOutcome::Promoted { .. }))
    }
}

/// Everything read from the ledger before training starts
struct UpgradeInputs {
    dataset_version: DatasetVersionId,
    examples: Vec<TrainingExample>,
    headroom: usize,
}

pub struct CapacityUpgradeManager<P, T, E>
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
    params: UpgradeParams,
    learning: LearningParams,
    operator_requests: Mutex<HashSet<RoleId>>,
    generator: Mutex<SituationGenerator>,
}

impl<P, T, E> CapacityUpgradeManager<P, T, E>
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
    ) -> Self {
        Self {
            provider,
            pipeline,
            harness,
            ledger,
            registry,
            store,
            events: Arc::new(NoEventSink),
            params: UpgradeParams::default(),
            learning: LearningParams::default(),
            operator_requests: Mutex::new(HashSet::new()),
            // Offset from the learning loop's generator so probes differ from collected situations
            generator: Mutex::new(SituationGenerator::starting_at(1 << 20)),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_params(mut self, params: UpgradeParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_learning_params(mut self, learning: LearningParams) -> Self {
        self.learning = learning;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EngineEventSink>) -> Self {
        self.events = events;
        self
    }

    // ==================== Triggers ====================

    /// Set the operator flag for a role
    pub fn request_upgrade(&self, role: &RoleId) -> Result<(), CapacityUpgradeError> {
        if self.registry.get(role).is_none() {
            return Err(CapacityUpgradeError::UnknownRole(role.clone()));
        }
        self.operator_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(role.clone());
        info!("Operator requested a capacity upgrade for {}", role);
        Ok(())
    }

    /// Triggers currently holding for a role
    pub fn triggers(&self, role: &RoleId) -> Vec<UpgradeTrigger> {
        let requested = self
            .operator_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(role);
        let criteria = self.params.criteria();
        self.ledger
            .with_role(role, |state| detect_triggers(&state.evaluations, &criteria, requested))
            .unwrap_or_else(|| {
                if requested {
                    vec![UpgradeTrigger::OperatorRequested]
                } else {
                    Vec::new()
                }
            })
    }

    /// Run an upgrade when any role has a trigger; `None` when nothing fired
    pub async fn check_and_upgrade(&self, probes: &[String]) -> Option<UpgradeReport> {
        let mut fired = false;
        for role in self.registry.roles() {
            let triggers = self.triggers(&role);
            if !triggers.is_empty() {
                info!(
                    "Upgrade triggered for {}: {}",
                    role,
                    triggers
                        .iter()
                        .map(UpgradeTrigger::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                self.events.emit(&EngineEvent::UpgradeTriggered {
                    role_id: role.clone(),
                    triggers,
                });
                fired = true;
            }
        }
        if !fired {
            return None;
        }
        Some(self.run_upgrade(probes).await)
    }

    // ==================== Upgrade ====================

    /// Retrain every role on the next tier and promote the ones that win.
    ///
    /// `probes` are the shared inputs of the parallel window; when empty,
    /// generated situations are used.
    pub async fn run_upgrade(&self, probes: &[String]) -> UpgradeReport {
        let probes = self.window_probes(probes);
        let roles = self.registry.roles();

        let outcomes = futures::future::join_all(roles.iter().map(|role| {
            let probes = &probes;
            async move {
                let outcome = match self.upgrade_role(role, probes).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Upgrade of {} failed: {}", role, e);
                        RoleUpgradeOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                RoleUpgrade {
                    role_id: role.clone(),
                    outcome,
                }
            }
        }))
        .await;

        let mut flags = self
            .operator_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for role in &roles {
            flags.remove(role);
        }
        UpgradeReport { roles: outcomes }
    }

    /// Revert a role to its most recent lower-tier model
    pub async fn demote(&self, role: &RoleId) -> Result<Arc<AdapterFusionConfig>, CapacityUpgradeError> {
        let before = self
            .registry
            .get(role)
            .ok_or_else(|| CapacityUpgradeError::UnknownRole(role.clone()))?;
        let demoted = self.registry.demote(role)?;

        self.ledger.with_role(role, |state| {
            state.evaluations.clear();
            state.deployed_evaluation = None;
        });
        if let Err(e) = self.store.save_fusion_config(&demoted).await {
            warn!("Could not persist fusion config for {}: {}", role, e);
        }
        self.events.emit(&EngineEvent::TierDemoted {
            role_id: role.clone(),
            from: before.capacity_tier,
            to: demoted.capacity_tier,
            model_version: demoted.active_model_version.clone(),
        });
        Ok(demoted)
    }

    async fn upgrade_role(
        &self,
        role: &RoleId,
        probes: &[String],
    ) -> Result<RoleUpgradeOutcome, CapacityUpgradeError> {
        if self.registry.get(role).is_none() {
            return Err(CapacityUpgradeError::UnknownRole(role.clone()));
        }
        let _claim = match self.ledger.claim_upgrade(role) {
            Ok(claim) => claim,
            Err(reason) => return Ok(skipped(reason)),
        };
        // Read only while the claim is held
        let active = self
            .registry
            .get(role)
            .ok_or_else(|| CapacityUpgradeError::UnknownRole(role.clone()))?;
        let Some(next_tier) = active.capacity_tier.next() else {
            return Ok(skipped("already on the top capacity tier"));
        };
        let inputs = match self.upgrade_inputs(role)? {
            Ok(inputs) => inputs,
            Err(reason) => return Ok(skipped(reason)),
        };

        let mut examples = inputs.examples;
        if self.params.distillation {
            let count = self.params.distillation_examples.min(inputs.headroom);
            examples.extend(self.distill(&active, count).await);
        }

        let job = self
            .pipeline
            .submit(TrainingJobRequest {
                role_id: role.clone(),
                capacity_tier: next_tier,
                base_model: active.active_model_version.clone(),
                dataset_version: inputs.dataset_version,
                examples,
            })
            .await?;
        info!("Training {} on {} tier ({})", role, next_tier, job);
        let candidate = await_training(
            self.pipeline.as_ref(),
            &job,
            self.learning.training_poll_interval,
            self.learning.training_timeout,
        )
        .await?;

        let (current_scores, candidate_scores) =
            self.parallel_window(&active, &candidate, next_tier, probes).await?;
        for score in &candidate_scores {
            if let Err(e) = self.store.save_evaluation(score).await {
                warn!("Could not persist evaluation of {}: {}", candidate, e);
                break;
            }
        }

        let current_mean = mean_overall(&current_scores).unwrap_or(0.0);
        let candidate_mean = mean_overall(&candidate_scores).unwrap_or(0.0);
        let margin = candidate_mean - current_mean;
        if candidate_scores.is_empty() || margin <= self.params.promotion_margin {
            info!(
                "{} stays on {}: {} leads by {:+.3} (needs > {:.3})",
                role, active.capacity_tier, next_tier, margin, self.params.promotion_margin
            );
            return Ok(RoleUpgradeOutcome::Retained {
                tier: active.capacity_tier,
                current_mean,
                candidate_mean,
            });
        }

        let promoted = self.registry.deploy_from(
            role,
            &active.active_model_version,
            next_tier,
            candidate.clone(),
        )?;
        if let Err(e) = self.store.save_fusion_config(&promoted).await {
            warn!("Could not persist fusion config for {}: {}", role, e);
        }
        // Plateau history belongs to the old tier
        self.ledger.with_role(role, |state| {
            state.evaluations.clear();
            state.deployed_evaluation = candidate_scores.last().cloned();
        });
        self.events.emit(&EngineEvent::TierPromoted {
            role_id: role.clone(),
            from: active.capacity_tier,
            to: next_tier,
            model_version: candidate.clone(),
            margin,
        });
        info!("Promoted {} to {} ({:+.3})", role, next_tier, margin);

        Ok(RoleUpgradeOutcome::Promoted {
            from: active.capacity_tier,
            to: next_tier,
            model_version: candidate,
            margin,
        })
    }

    /// Rebuild the latest dataset version's example set.
    ///
    /// The outer error aborts the upgrade; the inner one is a skip reason.
    fn upgrade_inputs(
        &self,
        role: &RoleId,
    ) -> Result<Result<UpgradeInputs, String>, CapacityUpgradeError> {
        self.ledger
            .with_role(role, |state| -> Result<Result<UpgradeInputs, String>, CapacityUpgradeError> {
                state
                    .corpus
                    .verify_original_integrity()
                    .map_err(CapacityUpgradeError::DatasetIntegrity)?;
                let Some(version) = state.versions.latest() else {
                    return Ok(Err("no curated dataset version yet".to_string()));
                };
                let plan = version.plan();
                Ok(Ok(UpgradeInputs {
                    dataset_version: version.version_id,
                    examples: state.corpus.blend(&version.boundary(), &plan),
                    headroom: plan.headroom(),
                }))
            })
            .unwrap_or_else(|| Ok(Err("role has no learning state".to_string())))
    }

    /// Current-tier answers to generated situations, for the training set only
    async fn distill(&self, active: &AdapterFusionConfig, count: usize) -> Vec<TrainingExample> {
        if count == 0 {
            return Vec::new();
        }
        let situations = self
            .generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate(&[], count);

        let mut examples = Vec::with_capacity(situations.len());
        for situation in &situations {
            match answer_situation(
                self.provider.as_ref(),
                active,
                situation,
                self.learning.situation_timeout,
            )
            .await
            {
                Ok(judgment) => examples.push(TrainingExample {
                    id: ExampleId::new(format!(
                        "{}-distill-{}",
                        active.role_id,
                        examples.len() + 1
                    )),
                    source: ExampleSource::SelfLearning,
                    role_id: active.role_id.clone(),
                    situation_text: situation.situation_text(),
                    response_text: response_text(&judgment),
                    feedback_label: FeedbackLabel::Unlabeled,
                    provenance: Provenance::now(),
                    supersedes: None,
                }),
                Err(e) => warn!("Distillation for {} skipped a situation: {}", active.role_id, e),
            }
        }
        examples
    }

    /// Score both tiers on the same inputs, side by side
    async fn parallel_window(
        &self,
        active: &AdapterFusionConfig,
        candidate: &ModelVersion,
        candidate_tier: CapacityTier,
        probes: &[String],
    ) -> Result<(Vec<EvaluationScore>, Vec<EvaluationScore>), EvaluationError> {
        let mut current_scores = Vec::with_capacity(probes.len());
        let mut candidate_scores = Vec::with_capacity(probes.len());

        for probe in probes {
            let current_request = EvaluationRequest {
                role_id: active.role_id.clone(),
                model_version: active.active_model_version.clone(),
                capacity_tier: active.capacity_tier,
                probes: vec![probe.clone()],
            };
            let candidate_request = EvaluationRequest {
                role_id: active.role_id.clone(),
                model_version: candidate.clone(),
                capacity_tier: candidate_tier,
                probes: vec![probe.clone()],
            };
            let (current, next) = tokio::join!(
                self.harness.evaluate(&current_request),
                self.harness.evaluate(&candidate_request)
            );
            current_scores.push(current?);
            candidate_scores.push(next?);
        }

        Ok((current_scores, candidate_scores))
    }

    fn window_probes(&self, probes: &[String]) -> Vec<String> {
        let window = self.params.parallel_window;
        if probes.is_empty() {
            return self
                .generator
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .generate(&[], window)
                .into_iter()
                .map(|s| s.situation_text())
                .collect();
        }
        probes.iter().cycle().take(window).cloned().collect()
    }
}

fn skipped(reason: impl Into<String>) -> RoleUpgradeOutcome {
    RoleUpgradeOutcome::Skipped {
        reason: reason.into(),
    }
}
