//! Decision requests entering the boardroom

use crate::core::{decision_type::DecisionType, role::RoleId, time::current_timestamp};
use serde::{Deserialize, Serialize};

/// Identifier of a single decision
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(String);

impl DecisionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A proposal submitted to the boardroom
///
/// `participating_roles` is an ordered set: duplicates are dropped on
/// construction and the remaining order is the evaluation order used for
/// the votes of the resulting outcome. The request is never mutated once
/// votes begin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision_id: DecisionId,
    pub decision_type: DecisionType,
    pub proposal_text: String,
    participating_roles: Vec<RoleId>,
    /// Milliseconds since epoch
    pub created_at: u64,
}

impl DecisionRequest {
    pub fn new(
        decision_id: DecisionId,
        decision_type: DecisionType,
        proposal_text: impl Into<String>,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> Self {
        let mut participating_roles: Vec<RoleId> = Vec::new();
        for role in roles {
            if !participating_roles.contains(&role) {
                participating_roles.push(role);
            }
        }

        Self {
            decision_id,
            decision_type,
            proposal_text: proposal_text.into(),
            participating_roles,
            created_at: current_timestamp(),
        }
    }

    pub fn participating_roles(&self) -> &[RoleId] {
        &self.participating_roles
    }

    pub fn is_participant(&self, role: &RoleId) -> bool {
        self.participating_roles.contains(role)
    }

    /// Situation text used when the decision is recorded as training material
    pub fn situation_text(&self) -> String {
        format!("[{}] {}", self.decision_type, self.proposal_text)
    }
}
