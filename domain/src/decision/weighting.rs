//! Static lookup tables consulted at decision time
//!
//! - [`RoleWeightProfile`]: `decision_type → role → voting weight multiplier`
//! - [`PurposeAlignmentTable`]: `role → decision_type → purpose alignment score`
//!
//! Both are read-only while decisions run; they change only through
//! governance configuration.

use crate::core::{decision_type::DecisionType, error::DomainError, role::RoleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multiplier used for roles a profile does not list
pub const DEFAULT_VOTING_WEIGHT: f64 = 1.0;

/// Alignment used for unlisted role/decision-type pairs ("requires careful consideration")
pub const DEFAULT_PURPOSE_ALIGNMENT: f64 = 0.5;

/// Per-decision-type voting weight multipliers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleWeightProfile {
    weights: BTreeMap<DecisionType, BTreeMap<RoleId, f64>>,
}

impl RoleWeightProfile {
    /// An empty profile: every role weighs 1.0
    pub fn uniform() -> Self {
        Self::default()
    }

    /// Set a multiplier. Multipliers must be finite and non-negative.
    pub fn with_weight(
        mut self,
        decision_type: DecisionType,
        role: RoleId,
        weight: f64,
    ) -> Result<Self, DomainError> {
        self.set_weight(decision_type, role, weight)?;
        Ok(self)
    }

    pub fn set_weight(
        &mut self,
        decision_type: DecisionType,
        role: RoleId,
        weight: f64,
    ) -> Result<(), DomainError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(DomainError::OutOfRange {
                field: format!("weights.{}.{}", decision_type, role),
                value: weight,
            });
        }
        self.weights
            .entry(decision_type)
            .or_default()
            .insert(role, weight);
        Ok(())
    }

    /// Resolve the voting weight for a role on a decision type
    pub fn weight_for(&self, decision_type: DecisionType, role: &RoleId) -> f64 {
        self.weights
            .get(&decision_type)
            .and_then(|roles| roles.get(role))
            .copied()
            .unwrap_or(DEFAULT_VOTING_WEIGHT)
    }

    /// Primary owners weigh 1.5, secondary owners 1.2
    pub fn boardroom_default() -> Self {
        use DecisionType::*;
        let entries: [(DecisionType, RoleId, f64); 14] = [
            (Investment, RoleId::Cfo, 1.5),
            (Investment, RoleId::Ceo, 1.2),
            (Strategic, RoleId::Ceo, 1.5),
            (Strategic, RoleId::Cmo, 1.2),
            (Financial, RoleId::Cfo, 1.5),
            (Financial, RoleId::Ceo, 1.2),
            (Technical, RoleId::Cto, 1.5),
            (Technical, RoleId::Coo, 1.2),
            (Operational, RoleId::Coo, 1.5),
            (Operational, RoleId::Chro, 1.2),
            (Governance, RoleId::GeneralCounsel, 1.5),
            (Governance, RoleId::Ceo, 1.2),
            (Governance, RoleId::Cfo, 1.2),
            (Strategic, RoleId::Cfo, 1.2),
        ];

        let mut profile = Self::default();
        for (decision_type, role, weight) in entries {
            profile
                .weights
                .entry(decision_type)
                .or_default()
                .insert(role, weight);
        }
        profile
    }
}

/// How relevant each decision type is to a role's mandate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurposeAlignmentTable {
    scores: BTreeMap<RoleId, BTreeMap<DecisionType, f64>>,
}

impl PurposeAlignmentTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set_score(
        &mut self,
        role: RoleId,
        decision_type: DecisionType,
        score: f64,
    ) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(DomainError::OutOfRange {
                field: format!("alignment.{}.{}", role, decision_type),
                value: score,
            });
        }
        self.scores
            .entry(role)
            .or_default()
            .insert(decision_type, score);
        Ok(())
    }

    pub fn with_score(
        mut self,
        role: RoleId,
        decision_type: DecisionType,
        score: f64,
    ) -> Result<Self, DomainError> {
        self.set_score(role, decision_type, score)?;
        Ok(self)
    }

    /// Alignment score, or 0.5 for unlisted combinations
    pub fn score_for(&self, role: &RoleId, decision_type: DecisionType) -> f64 {
        self.scores
            .get(role)
            .and_then(|types| types.get(&decision_type))
            .copied()
            .unwrap_or(DEFAULT_PURPOSE_ALIGNMENT)
    }

    /// Mandates of the default boardroom
    pub fn boardroom_default() -> Self {
        use DecisionType::*;
        let entries: [(RoleId, DecisionType, f64); 17] = [
            (RoleId::Ceo, Strategic, 0.9),
            (RoleId::Ceo, Governance, 0.8),
            (RoleId::Ceo, Investment, 0.75),
            (RoleId::Cfo, Financial, 0.9),
            (RoleId::Cfo, Investment, 0.85),
            (RoleId::Cfo, Governance, 0.7),
            (RoleId::Cto, Technical, 0.9),
            (RoleId::Cto, Strategic, 0.7),
            (RoleId::Coo, Operational, 0.9),
            (RoleId::Coo, Technical, 0.7),
            (RoleId::Cmo, Strategic, 0.8),
            (RoleId::Cmo, Investment, 0.7),
            (RoleId::Chro, Operational, 0.75),
            (RoleId::Chro, Governance, 0.7),
            (RoleId::GeneralCounsel, Governance, 0.9),
            (RoleId::GeneralCounsel, Financial, 0.7),
            (RoleId::GeneralCounsel, Investment, 0.7),
        ];

        let mut table = Self::default();
        for (role, decision_type, score) in entries {
            table
                .scores
                .entry(role)
                .or_default()
                .insert(decision_type, score);
        }
        table
    }
}
