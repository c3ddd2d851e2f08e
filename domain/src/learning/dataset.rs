//! Versioned dataset snapshots
//!
//! Each curation produces exactly one [`DatasetVersion`] per role. Versions
//! live in an append-only [`DatasetVersionLog`] indexed by a monotonic id,
//! so rolling back a dataset is a matter of pointing at an older id.

use super::blend::{BlendPlan, BlendRatio};
use super::corpus::SnapshotBoundary;
use crate::core::{role::RoleId, time::current_timestamp};
use serde::{Deserialize, Serialize};

/// Monotonic dataset version number (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetVersionId(u64);

impl DatasetVersionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DatasetVersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ds-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub version_id: DatasetVersionId,
    pub role_id: RoleId,
    /// Original entries visible at the snapshot
    pub original_ref: usize,
    /// Self-learning entry count at the snapshot cutoff
    pub self_learning_ref: usize,
    pub blend_ratio: BlendRatio,
    pub original_count: usize,
    pub self_learning_count: usize,
    /// Milliseconds since epoch
    pub created_at: u64,
}

impl DatasetVersion {
    pub fn boundary(&self) -> SnapshotBoundary {
        SnapshotBoundary {
            original_count: self.original_ref,
            self_learning_count: self.self_learning_ref,
        }
    }

    pub fn plan(&self) -> BlendPlan {
        BlendPlan {
            original_count: self.original_count,
            self_learning_count: self.self_learning_count,
            ratio: self.blend_ratio,
        }
    }

    pub fn total_examples(&self) -> usize {
        self.original_count + self.self_learning_count
    }
}

/// Append-only arena of dataset versions for one role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetVersionLog {
    versions: Vec<DatasetVersion>,
}

impl DatasetVersionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next version for a snapshot and blend plan
    pub fn record(
        &mut self,
        role_id: RoleId,
        boundary: SnapshotBoundary,
        plan: BlendPlan,
    ) -> &DatasetVersion {
        let version = self.draft(role_id, boundary, plan);
        self.versions.push(version);
        &self.versions[self.versions.len() - 1]
    }

    /// The version [`record`](Self::record) would create next, left unrecorded
    pub fn draft(&self, role_id: RoleId, boundary: SnapshotBoundary, plan: BlendPlan) -> DatasetVersion {
        DatasetVersion {
            version_id: self.next_id(),
            role_id,
            original_ref: boundary.original_count,
            self_learning_ref: boundary.self_learning_count,
            blend_ratio: plan.ratio,
            original_count: plan.original_count,
            self_learning_count: plan.self_learning_count,
            created_at: current_timestamp(),
        }
    }

    /// Record a drafted version; `false` if another version was recorded since the draft
    pub fn commit(&mut self, version: DatasetVersion) -> bool {
        if version.version_id != self.next_id() {
            return false;
        }
        self.versions.push(version);
        true
    }

    fn next_id(&self) -> DatasetVersionId {
        DatasetVersionId::new(self.versions.len() as u64 + 1)
    }

    pub fn get(&self, id: DatasetVersionId) -> Option<&DatasetVersion> {
        let index = id.get().checked_sub(1)? as usize;
        self.versions.get(index)
    }

    pub fn latest(&self) -> Option<&DatasetVersion> {
        self.versions.last()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetVersion> {
        self.versions.iter()
    }
}
