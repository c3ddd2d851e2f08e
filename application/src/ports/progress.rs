//! Progress notification port
//!
//! Defines the interface for reporting progress while a decision collects
//! its votes.

use boardroom_domain::{DecisionId, RoleId, Vote};

/// Callback for progress updates during vote collection
///
/// Implementations live in the presentation layer.
pub trait DecisionProgressNotifier: Send + Sync {
    /// Called once the per-role judgments have been dispatched
    fn on_collection_start(&self, decision_id: &DecisionId, roles: &[RoleId]);

    /// Called when a role's vote arrives
    fn on_vote(&self, vote: &Vote);

    /// Called when a role is recorded as abstaining
    fn on_abstention(&self, role: &RoleId, reason: &str);

    /// Called when the collection barrier is released
    fn on_collection_complete(&self, _decision_id: &DecisionId) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DecisionProgressNotifier for NoProgress {
    fn on_collection_start(&self, _decision_id: &DecisionId, _roles: &[RoleId]) {}
    fn on_vote(&self, _vote: &Vote) {}
    fn on_abstention(&self, _role: &RoleId, _reason: &str) {}
}
