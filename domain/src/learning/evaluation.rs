//! Evaluation scores for retrained models

use crate::adapter::fusion::ModelVersion;
use crate::core::{role::RoleId, time::current_timestamp};
use serde::{Deserialize, Serialize};

pub const ROLE_FIDELITY_WEIGHT: f64 = 0.30;
pub const LEADERSHIP_CLARITY_WEIGHT: f64 = 0.25;
pub const CONFLICT_WEIGHT: f64 = 0.20;
pub const GUARDRAIL_WEIGHT: f64 = 0.25;

/// Immutable evaluation of one model version for one role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub role_id: RoleId,
    pub model_version: ModelVersion,
    pub role_fidelity: f64,
    pub leadership_clarity: f64,
    /// Lower is better
    pub conflict_index: f64,
    pub guardrail_compliance: f64,
    pub overall: f64,
    /// Milliseconds since epoch
    pub evaluated_at: u64,
}

impl EvaluationScore {
    /// Build a score; inputs are clamped into `[0, 1]` and `overall` is derived
    pub fn new(
        role_id: RoleId,
        model_version: ModelVersion,
        role_fidelity: f64,
        leadership_clarity: f64,
        conflict_index: f64,
        guardrail_compliance: f64,
    ) -> Self {
        let role_fidelity = unit(role_fidelity);
        let leadership_clarity = unit(leadership_clarity);
        let conflict_index = unit(conflict_index);
        let guardrail_compliance = unit(guardrail_compliance);
        let overall = weighted_overall(
            role_fidelity,
            leadership_clarity,
            conflict_index,
            guardrail_compliance,
        );

        Self {
            role_id,
            model_version,
            role_fidelity,
            leadership_clarity,
            conflict_index,
            guardrail_compliance,
            overall,
            evaluated_at: current_timestamp(),
        }
    }

    /// True when this score falls more than `tolerance` below `baseline`
    pub fn regresses_from(&self, baseline: &EvaluationScore, tolerance: f64) -> bool {
        self.overall < baseline.overall - tolerance.max(0.0)
    }
}

pub fn weighted_overall(
    role_fidelity: f64,
    leadership_clarity: f64,
    conflict_index: f64,
    guardrail_compliance: f64,
) -> f64 {
    ROLE_FIDELITY_WEIGHT * role_fidelity
        + LEADERSHIP_CLARITY_WEIGHT * leadership_clarity
        + CONFLICT_WEIGHT * (1.0 - conflict_index)
        + GUARDRAIL_WEIGHT * guardrail_compliance
}

fn unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(fidelity: f64, clarity: f64, conflict: f64, guardrail: f64) -> EvaluationScore {
        EvaluationScore::new(
            RoleId::Cfo,
            ModelVersion::new("cfo-baseline-v1"),
            fidelity,
            clarity,
            conflict,
            guardrail,
        )
    }

    #[test]
    fn test_overall_weights() {
        let s = score(0.8, 0.6, 0.3, 0.9);
        // 0.24 + 0.15 + 0.14 + 0.225
        assert!((s.overall - 0.755).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_and_worst_scores() {
        assert!((score(1.0, 1.0, 0.0, 1.0).overall - 1.0).abs() < 1e-9);
        assert!(score(0.0, 0.0, 1.0, 0.0).overall.abs() < 1e-9);
    }

    #[test]
    fn test_inputs_clamped() {
        let s = score(1.4, -0.2, f64::NAN, 0.5);
        assert_eq!(s.role_fidelity, 1.0);
        assert_eq!(s.leadership_clarity, 0.0);
        assert_eq!(s.conflict_index, 0.0);
    }

    #[test]
    fn test_regression_check() {
        let deployed = score(0.8, 0.8, 0.2, 0.8);
        let worse = score(0.7, 0.8, 0.2, 0.8);
        let same = score(0.8, 0.8, 0.2, 0.8);

        assert!(worse.regresses_from(&deployed, 0.0));
        assert!(!worse.regresses_from(&deployed, 0.05));
        assert!(!same.regresses_from(&deployed, 0.0));
    }
}
