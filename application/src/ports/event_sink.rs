//! Port for audit and notification events.
//!
//! Defines the [`EngineEventSink`] trait for emitting engine events (decision
//! outcomes, model deployments, rollbacks, governance violations) to external
//! consumers.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port carries the machine-readable
//! audit trail (JSONL).

use boardroom_domain::{
    CapacityTier, DatasetVersionId, DecisionId, DecisionOutcome, DecisionType, ModelVersion,
    OutcomeCategory, RoleId, UpgradeTrigger,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    OutcomeCreated {
        decision_id: DecisionId,
        decision_type: DecisionType,
        category: OutcomeCategory,
        aggregate_score: f64,
        consensus_score: f64,
        votes: usize,
        abstentions: usize,
    },
    DecisionFailed {
        decision_id: DecisionId,
        reason: String,
    },
    DecisionCancelled {
        decision_id: DecisionId,
    },
    ModelDeployed {
        role_id: RoleId,
        capacity_tier: CapacityTier,
        model_version: ModelVersion,
        previous_version: ModelVersion,
        dataset_version: Option<DatasetVersionId>,
        overall: f64,
    },
    ModelRolledBack {
        role_id: RoleId,
        rejected_version: ModelVersion,
        active_version: ModelVersion,
        reason: String,
    },
    IntegrityViolation {
        role_id: RoleId,
        example_id: String,
        reason: String,
    },
    UpgradeTriggered {
        role_id: RoleId,
        triggers: Vec<UpgradeTrigger>,
    },
    TierPromoted {
        role_id: RoleId,
        from: CapacityTier,
        to: CapacityTier,
        model_version: ModelVersion,
        margin: f64,
    },
    TierDemoted {
        role_id: RoleId,
        from: CapacityTier,
        to: CapacityTier,
        model_version: ModelVersion,
    },
}

impl EngineEvent {
    pub fn outcome_created(outcome: &DecisionOutcome) -> Self {
        EngineEvent::OutcomeCreated {
            decision_id: outcome.decision_id().clone(),
            decision_type: outcome.decision_type(),
            category: outcome.category(),
            aggregate_score: outcome.aggregate_score(),
            consensus_score: outcome.consensus_score(),
            votes: outcome.votes().len(),
            abstentions: outcome.abstentions().count(),
        }
    }

    /// Event type identifier, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::OutcomeCreated { .. } => "outcome_created",
            EngineEvent::DecisionFailed { .. } => "decision_failed",
            EngineEvent::DecisionCancelled { .. } => "decision_cancelled",
            EngineEvent::ModelDeployed { .. } => "model_deployed",
            EngineEvent::ModelRolledBack { .. } => "model_rolled_back",
            EngineEvent::IntegrityViolation { .. } => "integrity_violation",
            EngineEvent::UpgradeTriggered { .. } => "upgrade_triggered",
            EngineEvent::TierPromoted { .. } => "tier_promoted",
            EngineEvent::TierDemoted { .. } => "tier_demoted",
        }
    }
}

/// Port for emitting engine events.
///
/// `emit` is synchronous and non-fallible so that audit output can never
/// disrupt a decision or a learning cycle; sink failures are swallowed.
pub trait EngineEventSink: Send + Sync {
    fn emit(&self, event: &EngineEvent);
}

/// No-op implementation for tests and when event logging is disabled.
pub struct NoEventSink;

impl EngineEventSink for NoEventSink {
    fn emit(&self, _event: &EngineEvent) {}
}
