//! Vote types for boardroom decisions
//!
//! This module defines the voting primitive cast by each role. A vote is
//! immutable once created; the outcome that collected it owns it.

use crate::core::{role::RoleId, time::current_timestamp};
use serde::{Deserialize, Serialize};

/// Values within this distance of zero count as neither approval nor rejection.
pub const AMBIVALENCE_BAND: f64 = 0.05;

/// A single vote from a role in a boardroom decision
///
/// # Example
///
/// ```
/// use boardroom_domain::{RoleId, Vote};
///
/// let vote = Vote::new(RoleId::Cfo, 0.8, 0.9, "Strong margins", 0.9, 0.85);
/// assert!(vote.is_approval());
///
/// let abstain = Vote::abstention(RoleId::Cto, "judgment unavailable: timeout");
/// assert_eq!(abstain.confidence(), 0.0);
/// assert!(abstain.is_abstention());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    voter_id: RoleId,
    /// -1.0 (reject) to 1.0 (approve)
    vote_value: f64,
    /// 0.0 to 1.0
    confidence: f64,
    rationale: String,
    domain_judgment_score: f64,
    purpose_alignment_score: f64,
    /// Milliseconds since epoch
    timestamp: u64,
}

impl Vote {
    /// Create a new vote; every score is clamped into its range
    pub fn new(
        voter_id: RoleId,
        vote_value: f64,
        confidence: f64,
        rationale: impl Into<String>,
        domain_judgment_score: f64,
        purpose_alignment_score: f64,
    ) -> Self {
        Self {
            voter_id,
            vote_value: clamp_finite(vote_value, -1.0, 1.0),
            confidence: clamp_finite(confidence, 0.0, 1.0),
            rationale: rationale.into(),
            domain_judgment_score: clamp_finite(domain_judgment_score, 0.0, 1.0),
            purpose_alignment_score: clamp_finite(purpose_alignment_score, 0.0, 1.0),
            timestamp: current_timestamp(),
        }
    }

    /// A zero-confidence, zero-value vote for a role whose judgment was
    /// unavailable (failure or timeout). It never blocks the decision.
    pub fn abstention(voter_id: RoleId, rationale: impl Into<String>) -> Self {
        Self {
            voter_id,
            vote_value: 0.0,
            confidence: 0.0,
            rationale: rationale.into(),
            domain_judgment_score: 0.0,
            purpose_alignment_score: 0.0,
            timestamp: current_timestamp(),
        }
    }

    pub fn voter_id(&self) -> &RoleId {
        &self.voter_id
    }

    pub fn vote_value(&self) -> f64 {
        self.vote_value
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn domain_judgment_score(&self) -> f64 {
        self.domain_judgment_score
    }

    pub fn purpose_alignment_score(&self) -> f64 {
        self.purpose_alignment_score
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn is_abstention(&self) -> bool {
        self.confidence == 0.0
    }

    pub fn is_approval(&self) -> bool {
        self.vote_value > AMBIVALENCE_BAND
    }

    pub fn is_rejection(&self) -> bool {
        self.vote_value < -AMBIVALENCE_BAND
    }

    /// Visual marker: ● approve, ○ reject, ◐ ambivalent, · abstain
    pub fn symbol(&self) -> char {
        if self.is_abstention() {
            '·'
        } else if self.is_approval() {
            '●'
        } else if self.is_rejection() {
            '○'
        } else {
            '◐'
        }
    }
}

fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0_f64.clamp(min, max);
    }
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_creation() {
        let vote = Vote::new(RoleId::Cfo, 0.8, 0.9, "Looks good", 0.9, 0.85);
        assert_eq!(vote.voter_id(), &RoleId::Cfo);
        assert_eq!(vote.vote_value(), 0.8);
        assert_eq!(vote.rationale(), "Looks good");
        assert!(vote.is_approval());
        assert!(!vote.is_abstention());
    }

    #[test]
    fn test_vote_clamping() {
        let vote = Vote::new(RoleId::Cto, 1.7, -0.3, "", 1.2, f64::NAN);
        assert_eq!(vote.vote_value(), 1.0);
        assert_eq!(vote.confidence(), 0.0);
        assert_eq!(vote.domain_judgment_score(), 1.0);
        assert_eq!(vote.purpose_alignment_score(), 0.0);
    }

    #[test]
    fn test_abstention() {
        let vote = Vote::abstention(RoleId::Coo, "timed out");
        assert!(vote.is_abstention());
        assert_eq!(vote.vote_value(), 0.0);
        assert_eq!(vote.symbol(), '·');
    }

    #[test]
    fn test_vote_symbols() {
        assert_eq!(Vote::new(RoleId::Ceo, 0.6, 0.5, "", 0.5, 0.5).symbol(), '●');
        assert_eq!(Vote::new(RoleId::Ceo, -0.6, 0.5, "", 0.5, 0.5).symbol(), '○');
        assert_eq!(Vote::new(RoleId::Ceo, 0.01, 0.5, "", 0.5, 0.5).symbol(), '◐');
    }
}
