//! Boardroom configuration container.
//!
//! [`BoardConfig`] groups the parameter slices and the static voting tables
//! so the entrypoint can hand each use case only the part it needs.
//!
//! | Type | Decision | Learning | Upgrade |
//! |------|----------|----------|---------|
//! | `EngineParams` | Yes | No | No |
//! | `LearningParams` | No | Yes | Yes |
//! | `UpgradeParams` | No | No | Yes |
//! | `RoleWeightProfile` | Yes | No | No |
//! | `PurposeAlignmentTable` | Yes | No | No |
//! | `AdapterFusionConfig` (roles) | Yes | Yes | Yes |

use super::{EngineParams, LearningParams, UpgradeParams};
use boardroom_domain::{AdapterFusionConfig, PurposeAlignmentTable, RoleId, RoleWeightProfile};

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub engine: EngineParams,
    pub learning: LearningParams,
    pub upgrade: UpgradeParams,
    pub weights: RoleWeightProfile,
    pub alignment: PurposeAlignmentTable,
    pub roles: Vec<AdapterFusionConfig>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            engine: EngineParams::default(),
            learning: LearningParams::default(),
            upgrade: UpgradeParams::default(),
            weights: RoleWeightProfile::boardroom_default(),
            alignment: PurposeAlignmentTable::boardroom_default(),
            roles: RoleId::default_board()
                .into_iter()
                .map(AdapterFusionConfig::baseline)
                .collect(),
        }
    }
}

impl BoardConfig {
    pub fn role_ids(&self) -> Vec<RoleId> {
        self.roles.iter().map(|r| r.role_id.clone()).collect()
    }
}
