//! Adapter Fusion Registry
//!
//! Holds the live [`AdapterFusionConfig`] for every role plus the full
//! deployment lineage. Readers receive an `Arc` snapshot, so a concurrent
//! deploy is observed either entirely or not at all. The lock is only held
//! for the swap itself, never across an await point.

use boardroom_domain::{AdapterFusionConfig, CapacityTier, ModelVersion, RoleId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Role {0} is not registered")]
    UnknownRole(RoleId),

    #[error("Role {0} has no earlier model version to roll back to")]
    NothingToRollBack(RoleId),

    #[error("Role {0} is already on the lowest capacity tier")]
    AlreadyAtLowestTier(RoleId),

    #[error("Role {role} moved from {expected} to {active} in the meantime")]
    Conflict {
        role: RoleId,
        expected: ModelVersion,
        active: ModelVersion,
    },
}

#[derive(Debug)]
struct Lineage {
    /// Every configuration ever active for the role, oldest first
    history: Vec<Arc<AdapterFusionConfig>>,
    active: usize,
}

impl Lineage {
    fn current(&self) -> Arc<AdapterFusionConfig> {
        Arc::clone(&self.history[self.active])
    }
}

#[derive(Debug, Default)]
pub struct AdapterFusionRegistry {
    entries: RwLock<HashMap<RoleId, Lineage>>,
}

impl AdapterFusionRegistry {
    pub fn new(configs: impl IntoIterator<Item = AdapterFusionConfig>) -> Self {
        let entries = configs
            .into_iter()
            .map(|config| {
                (
                    config.role_id.clone(),
                    Lineage {
                        history: vec![Arc::new(config)],
                        active: 0,
                    },
                )
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Snapshot of the role's active configuration
    pub fn get(&self, role: &RoleId) -> Option<Arc<AdapterFusionConfig>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(role).map(Lineage::current)
    }

    pub fn roles(&self) -> Vec<RoleId> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut roles: Vec<RoleId> = entries.keys().cloned().collect();
        roles.sort();
        roles
    }

    /// Every configuration the role has run, oldest first
    pub fn history(&self, role: &RoleId) -> Vec<Arc<AdapterFusionConfig>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(role)
            .map(|l| l.history.clone())
            .unwrap_or_default()
    }

    /// Make `version` on `tier` the active model for a role
    pub fn deploy(
        &self,
        role: &RoleId,
        tier: CapacityTier,
        version: ModelVersion,
    ) -> Result<Arc<AdapterFusionConfig>, RegistryError> {
        self.swap(role, None, tier, version)
    }

    /// Deploy only while `expected` is still the active version
    pub fn deploy_from(
        &self,
        role: &RoleId,
        expected: &ModelVersion,
        tier: CapacityTier,
        version: ModelVersion,
    ) -> Result<Arc<AdapterFusionConfig>, RegistryError> {
        self.swap(role, Some(expected), tier, version)
    }

    fn swap(
        &self,
        role: &RoleId,
        expected: Option<&ModelVersion>,
        tier: CapacityTier,
        version: ModelVersion,
    ) -> Result<Arc<AdapterFusionConfig>, RegistryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let lineage = entries
            .get_mut(role)
            .ok_or_else(|| RegistryError::UnknownRole(role.clone()))?;

        let current = lineage.current();
        if let Some(expected) = expected
            && &current.active_model_version != expected
        {
            return Err(RegistryError::Conflict {
                role: role.clone(),
                expected: expected.clone(),
                active: current.active_model_version.clone(),
            });
        }

        let next = Arc::new(current.deployed(tier, version));
        lineage.history.push(Arc::clone(&next));
        lineage.active = lineage.history.len() - 1;

        info!(
            "Deployed {} ({}) for {}",
            next.active_model_version, next.capacity_tier, role
        );
        Ok(next)
    }

    /// Reactivate the entry deployed before the active one
    pub fn rollback(&self, role: &RoleId) -> Result<Arc<AdapterFusionConfig>, RegistryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let lineage = entries
            .get_mut(role)
            .ok_or_else(|| RegistryError::UnknownRole(role.clone()))?;

        if lineage.active == 0 {
            return Err(RegistryError::NothingToRollBack(role.clone()));
        }
        lineage.active -= 1;
        let current = lineage.current();
        info!("Rolled {} back to {}", role, current.active_model_version);
        Ok(current)
    }

    /// Reactivate the most recent entry on a lower tier than the active one
    pub fn demote(&self, role: &RoleId) -> Result<Arc<AdapterFusionConfig>, RegistryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let lineage = entries
            .get_mut(role)
            .ok_or_else(|| RegistryError::UnknownRole(role.clone()))?;

        let tier = lineage.current().capacity_tier;
        let target = lineage
            .history
            .iter()
            .rposition(|c| c.capacity_tier < tier)
            .ok_or_else(|| RegistryError::AlreadyAtLowestTier(role.clone()))?;

        // Appended rather than re-pointed, so the demotion itself is in the lineage
        let demoted = Arc::clone(&lineage.history[target]);
        lineage.history.push(Arc::clone(&demoted));
        lineage.active = lineage.history.len() - 1;
        info!(
            "Demoted {} to {} ({})",
            role, demoted.capacity_tier, demoted.active_model_version
        );
        Ok(demoted)
    }
}
