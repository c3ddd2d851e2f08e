//! Adapter fusion configuration
//!
//! Each role's domain judgment runs on a fused model: a domain adapter and a
//! leadership adapter mixed by `domain_weight`. The active model version and
//! capacity tier are swapped as a unit when a new model is deployed.

use crate::core::{error::DomainError, role::RoleId};
use serde::{Deserialize, Serialize};

/// Opaque handle to a trained model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVersion(String);

impl ModelVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The initial model for a role at a tier
    pub fn initial(role: &RoleId, tier: CapacityTier) -> Self {
        Self(format!("{}-{}-v0", role, tier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discrete model scale available to a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapacityTier {
    #[default]
    Baseline,
    Upgraded,
}

impl CapacityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityTier::Baseline => "baseline",
            CapacityTier::Upgraded => "upgraded",
        }
    }

    /// The tier above this one, if any
    pub fn next(&self) -> Option<CapacityTier> {
        match self {
            CapacityTier::Baseline => Some(CapacityTier::Upgraded),
            CapacityTier::Upgraded => None,
        }
    }
}

impl std::fmt::Display for CapacityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CapacityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baseline" | "base" => Ok(CapacityTier::Baseline),
            "upgraded" | "upgrade" => Ok(CapacityTier::Upgraded),
            other => Err(format!("Unknown capacity tier: {}", other)),
        }
    }
}

pub const DEFAULT_DOMAIN_WEIGHT: f64 = 0.6;

/// Registry entry for one role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterFusionConfig {
    pub role_id: RoleId,
    domain_weight: f64,
    pub capacity_tier: CapacityTier,
    pub active_model_version: ModelVersion,
}

impl AdapterFusionConfig {
    pub fn new(role_id: RoleId, domain_weight: f64) -> Result<Self, DomainError> {
        validate_domain_weight(domain_weight)?;
        let active_model_version = ModelVersion::initial(&role_id, CapacityTier::Baseline);
        Ok(Self {
            role_id,
            domain_weight,
            capacity_tier: CapacityTier::Baseline,
            active_model_version,
        })
    }

    pub fn baseline(role_id: RoleId) -> Self {
        let active_model_version = ModelVersion::initial(&role_id, CapacityTier::Baseline);
        Self {
            role_id,
            domain_weight: DEFAULT_DOMAIN_WEIGHT,
            capacity_tier: CapacityTier::Baseline,
            active_model_version,
        }
    }

    pub fn domain_weight(&self) -> f64 {
        self.domain_weight
    }

    /// Always `1 - domain_weight`
    pub fn leadership_weight(&self) -> f64 {
        1.0 - self.domain_weight
    }

    pub fn with_domain_weight(mut self, domain_weight: f64) -> Result<Self, DomainError> {
        validate_domain_weight(domain_weight)?;
        self.domain_weight = domain_weight;
        Ok(self)
    }

    /// Copy of this config pointing at another model
    pub fn deployed(&self, tier: CapacityTier, version: ModelVersion) -> Self {
        Self {
            role_id: self.role_id.clone(),
            domain_weight: self.domain_weight,
            capacity_tier: tier,
            active_model_version: version,
        }
    }
}

fn validate_domain_weight(weight: f64) -> Result<(), DomainError> {
    if weight.is_finite() && weight > 0.0 && weight < 1.0 {
        Ok(())
    } else {
        Err(DomainError::InvalidFusionWeight(weight))
    }
}
