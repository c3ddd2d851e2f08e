//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod capacity_upgrade;
pub mod decision_service;
pub mod learning_cycle;
pub mod run_decision;
pub(crate) mod shared;
pub mod synthesize_vote;

#[cfg(test)]
pub(crate) mod test_support;

pub use capacity_upgrade::{
    CapacityUpgradeError, CapacityUpgradeManager, RoleUpgrade, RoleUpgradeOutcome, UpgradeReport,
};
pub use decision_service::{DecisionService, DecisionServiceError, DecisionStatus, RoleStatus};
pub use learning_cycle::{CycleOutcome, CycleReport, LearningCycleError, SelfLearningLoop};
pub use run_decision::{RunDecisionError, RunDecisionUseCase};
pub use synthesize_vote::{SynthesizeVoteError, VoteSynthesizer};
