//! Vote synthesis math
//!
//! Turns a role's domain judgment plus its purpose alignment into a single
//! [`Vote`]. All functions here are pure; the I/O half (calling the judgment
//! provider under a timeout) lives in the application layer.
//!
//! ```text
//! combined = domain_judgment * 0.7 + purpose_alignment * 0.3
//!
//!   combined:  0.0 ........ 0.4 ~~~~~~~~ 0.6 ........ 1.0
//!   value:    -1.0 ...... -0.2 (-0.05..0.05) 0.2 ..... 1.0
//!                reject        careful zone      approve
//! ```

use super::vote::Vote;
use crate::core::role::RoleId;

pub const DOMAIN_JUDGMENT_WEIGHT: f64 = 0.7;
pub const PURPOSE_ALIGNMENT_WEIGHT: f64 = 0.3;

/// `combined` at or above this approves
pub const APPROVE_THRESHOLD: f64 = 0.6;
/// `combined` at or below this rejects
pub const REJECT_THRESHOLD: f64 = 0.4;

/// Used when the provider reports no confidence or the role has no history
pub const NEUTRAL_SIGNAL: f64 = 0.5;

const PROVIDER_CONFIDENCE_SHARE: f64 = 0.4;
const ALIGNMENT_STRENGTH_SHARE: f64 = 0.3;
const TRACK_RECORD_SHARE: f64 = 0.3;

/// Everything needed to synthesize one vote
#[derive(Debug, Clone)]
pub struct SynthesisInputs {
    pub domain_judgment_score: f64,
    /// The provider's own confidence, if reported
    pub provider_confidence: Option<f64>,
    pub purpose_alignment_score: f64,
    /// Historical vote/outcome agreement for the role, if any
    pub historical_accuracy: Option<f64>,
    /// Free text returned by the provider
    pub judgment_rationale: String,
}

/// Which signal pulled the vote furthest from neutral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominantFactor {
    DomainJudgment,
    PurposeAlignment,
}

impl DominantFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            DominantFactor::DomainJudgment => "domain judgment",
            DominantFactor::PurposeAlignment => "purpose alignment",
        }
    }
}

pub fn combined_score(domain_judgment_score: f64, purpose_alignment_score: f64) -> f64 {
    domain_judgment_score.clamp(0.0, 1.0) * DOMAIN_JUDGMENT_WEIGHT
        + purpose_alignment_score.clamp(0.0, 1.0) * PURPOSE_ALIGNMENT_WEIGHT
}

/// Map a combined score onto a vote value
///
/// Both decisive bands scale linearly (`[0.6, 1.0] → [0.2, 1.0]`,
/// `[0.0, 0.4] → [-1.0, -0.2]`). The careful zone between them is
/// compressed into `(-0.05, 0.05)`, which never reads as approve or reject.
pub fn vote_value_for(combined: f64) -> f64 {
    let combined = combined.clamp(0.0, 1.0);
    if combined >= APPROVE_THRESHOLD || combined <= REJECT_THRESHOLD {
        (combined - 0.5) / 0.5
    } else {
        (combined - 0.5) * 0.5
    }
}

/// 40% provider confidence, 30% alignment strength, 30% track record
pub fn vote_confidence(
    provider_confidence: Option<f64>,
    purpose_alignment_score: f64,
    historical_accuracy: Option<f64>,
) -> f64 {
    let provider = provider_confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(NEUTRAL_SIGNAL);
    let alignment_strength = ((purpose_alignment_score.clamp(0.0, 1.0) - 0.5).abs() * 2.0).min(1.0);
    let history = historical_accuracy
        .filter(|a| a.is_finite())
        .map(|a| a.clamp(0.0, 1.0))
        .unwrap_or(NEUTRAL_SIGNAL);

    (PROVIDER_CONFIDENCE_SHARE * provider
        + ALIGNMENT_STRENGTH_SHARE * alignment_strength
        + TRACK_RECORD_SHARE * history)
        .clamp(0.0, 1.0)
}

/// Compare each signal's weighted pull away from its neutral point
pub fn dominant_factor(domain_judgment_score: f64, purpose_alignment_score: f64) -> DominantFactor {
    let judgment_pull = ((domain_judgment_score - 0.5) * DOMAIN_JUDGMENT_WEIGHT).abs();
    let alignment_pull = ((purpose_alignment_score - 0.5) * PURPOSE_ALIGNMENT_WEIGHT).abs();
    if alignment_pull > judgment_pull {
        DominantFactor::PurposeAlignment
    } else {
        DominantFactor::DomainJudgment
    }
}

/// Build the vote for a role from its inputs
pub fn synthesize(role: RoleId, inputs: &SynthesisInputs) -> Vote {
    let combined = combined_score(inputs.domain_judgment_score, inputs.purpose_alignment_score);
    let vote_value = vote_value_for(combined);
    let confidence = vote_confidence(
        inputs.provider_confidence,
        inputs.purpose_alignment_score,
        inputs.historical_accuracy,
    );
    let factor = dominant_factor(inputs.domain_judgment_score, inputs.purpose_alignment_score);

    let stance = if combined >= APPROVE_THRESHOLD {
        "Supports"
    } else if combined <= REJECT_THRESHOLD {
        "Opposes"
    } else {
        "Requires careful consideration"
    };
    let factor_score = match factor {
        DominantFactor::DomainJudgment => inputs.domain_judgment_score,
        DominantFactor::PurposeAlignment => inputs.purpose_alignment_score,
    };

    let mut rationale = format!(
        "{} ({} {:.2}, combined {:.2})",
        stance,
        factor.as_str(),
        factor_score,
        combined
    );
    let detail = inputs.judgment_rationale.trim();
    if !detail.is_empty() {
        rationale.push_str(": ");
        rationale.push_str(detail);
    }

    Vote::new(
        role,
        vote_value,
        confidence,
        rationale,
        inputs.domain_judgment_score,
        inputs.purpose_alignment_score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(judgment: f64, alignment: f64) -> SynthesisInputs {
        SynthesisInputs {
            domain_judgment_score: judgment,
            provider_confidence: None,
            purpose_alignment_score: alignment,
            historical_accuracy: None,
            judgment_rationale: String::new(),
        }
    }

    #[test]
    fn test_combined_score_weights() {
        let combined = combined_score(0.8, 0.9);
        assert!((combined - 0.83).abs() < 1e-9);
    }

    #[test]
    fn test_decisive_bands_are_linear() {
        assert!((vote_value_for(1.0) - 1.0).abs() < 1e-9);
        assert!((vote_value_for(0.6) - 0.2).abs() < 1e-9);
        assert!((vote_value_for(0.8) - 0.6).abs() < 1e-9);
        assert!((vote_value_for(0.0) + 1.0).abs() < 1e-9);
        assert!((vote_value_for(0.4) + 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_careful_zone_stays_near_zero() {
        for combined in [0.41, 0.45, 0.5, 0.55, 0.59] {
            let value = vote_value_for(combined);
            assert!(value.abs() < 0.05, "combined {} -> {}", combined, value);
        }
        assert!(vote_value_for(0.55) > 0.0);
        assert!(vote_value_for(0.45) < 0.0);
    }

    #[test]
    fn test_confidence_defaults() {
        // No provider confidence, neutral alignment, no history
        let confidence = vote_confidence(None, 0.5, None);
        assert!((confidence - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_blend() {
        // 0.4 * 0.9 + 0.3 * 0.8 + 0.3 * 0.6
        let confidence = vote_confidence(Some(0.9), 0.9, Some(0.6));
        assert!((confidence - 0.78).abs() < 1e-9);
    }

    #[test]
    fn test_dominant_factor() {
        assert_eq!(dominant_factor(0.95, 0.5), DominantFactor::DomainJudgment);
        assert_eq!(dominant_factor(0.52, 0.9), DominantFactor::PurposeAlignment);
    }

    #[test]
    fn test_synthesize_vote() {
        let mut input = inputs(0.9, 0.85);
        input.provider_confidence = Some(0.8);
        input.judgment_rationale = "Payback inside two years".to_string();

        let vote = synthesize(RoleId::Cfo, &input);

        assert!(vote.is_approval());
        assert_eq!(vote.voter_id(), &RoleId::Cfo);
        assert!(vote.rationale().starts_with("Supports (domain judgment 0.90"));
        assert!(vote.rationale().ends_with("Payback inside two years"));
        assert_eq!(vote.domain_judgment_score(), 0.9);
    }

    #[test]
    fn test_synthesize_careful_zone_vote() {
        let vote = synthesize(RoleId::Cmo, &inputs(0.5, 0.5));
        assert!(!vote.is_approval());
        assert!(!vote.is_rejection());
        assert!(vote.rationale().starts_with("Requires careful consideration"));
    }
}
