//! Per-role vote/outcome agreement history

use super::consensus::DecisionOutcome;
use crate::core::role::RoleId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How often a role's votes agreed with the final outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub agreed: u32,
    pub counted: u32,
}

impl TrackRecord {
    /// Agreement ratio, or `None` without history
    pub fn accuracy(&self) -> Option<f64> {
        (self.counted > 0).then(|| self.agreed as f64 / self.counted as f64)
    }
}

/// Track records for every role seen so far
#[derive(Debug, Clone, Default)]
pub struct TrackRecordBook {
    records: HashMap<RoleId, TrackRecord>,
}

impl TrackRecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accuracy(&self, role: &RoleId) -> Option<f64> {
        self.records.get(role).and_then(TrackRecord::accuracy)
    }

    pub fn record(&self, role: &RoleId) -> TrackRecord {
        self.records.get(role).copied().unwrap_or_default()
    }

    /// Score every decisive, non-abstaining vote against a resolved outcome.
    ///
    /// Deferred and review outcomes carry no direction and are skipped.
    pub fn observe(&mut self, outcome: &DecisionOutcome) {
        let direction = outcome.category().direction();
        if direction == 0 {
            return;
        }
        for vote in outcome.votes() {
            if vote.is_abstention() || !(vote.is_approval() || vote.is_rejection()) {
                continue;
            }
            let agrees = (direction > 0 && vote.is_approval()) || (direction < 0 && vote.is_rejection());
            let entry = self.records.entry(vote.voter_id().clone()).or_default();
            entry.counted += 1;
            if agrees {
                entry.agreed += 1;
            }
        }
    }
}
