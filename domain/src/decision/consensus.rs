//! Consensus aggregation
//!
//! Collapses a vote set into a single [`DecisionOutcome`]. Aggregation is
//! deterministic: the same request, votes and weight profile always yield
//! an identical outcome.

use super::request::{DecisionId, DecisionRequest};
use super::vote::Vote;
use super::weighting::RoleWeightProfile;
use crate::core::{decision_type::DecisionType, error::DomainError, role::RoleId, text};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tolerance applied to the inclusive category boundaries
pub const BOUNDARY_EPSILON: f64 = 1e-9;

pub const STRONG_APPROVAL_SCORE: f64 = 0.6;
pub const STRONG_CONSENSUS: f64 = 0.7;
pub const STRONG_OPPOSITION_SCORE: f64 = -0.6;
pub const LOW_CONSENSUS: f64 = 0.4;

/// Outcome category of an aggregated decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeCategory {
    ApprovedStrongConsensus,
    RejectedStrongOpposition,
    ApprovedMajority,
    DeferredLowConsensus,
    ReviewRequired,
}

impl OutcomeCategory {
    /// Classify a score pair. First match wins:
    ///
    /// 1. `aggregate ≥ 0.6 ∧ consensus ≥ 0.7` → strong consensus
    /// 2. `aggregate ≤ -0.6` → strong opposition
    /// 3. `aggregate > 0` → majority
    /// 4. `consensus < 0.4` → deferred
    /// 5. otherwise → review
    pub fn classify(aggregate_score: f64, consensus_score: f64) -> Self {
        if aggregate_score >= STRONG_APPROVAL_SCORE - BOUNDARY_EPSILON
            && consensus_score >= STRONG_CONSENSUS - BOUNDARY_EPSILON
        {
            OutcomeCategory::ApprovedStrongConsensus
        } else if aggregate_score <= STRONG_OPPOSITION_SCORE + BOUNDARY_EPSILON {
            OutcomeCategory::RejectedStrongOpposition
        } else if aggregate_score > 0.0 {
            OutcomeCategory::ApprovedMajority
        } else if consensus_score < LOW_CONSENSUS {
            OutcomeCategory::DeferredLowConsensus
        } else {
            OutcomeCategory::ReviewRequired
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCategory::ApprovedStrongConsensus => "APPROVED_STRONG_CONSENSUS",
            OutcomeCategory::RejectedStrongOpposition => "REJECTED_STRONG_OPPOSITION",
            OutcomeCategory::ApprovedMajority => "APPROVED_MAJORITY",
            OutcomeCategory::DeferredLowConsensus => "DEFERRED_LOW_CONSENSUS",
            OutcomeCategory::ReviewRequired => "REVIEW_REQUIRED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutcomeCategory::ApprovedStrongConsensus => "Approved with strong consensus",
            OutcomeCategory::RejectedStrongOpposition => "Rejected by strong opposition",
            OutcomeCategory::ApprovedMajority => "Approved by majority",
            OutcomeCategory::DeferredLowConsensus => "Deferred for low consensus",
            OutcomeCategory::ReviewRequired => "Review required",
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(
            self,
            OutcomeCategory::ApprovedStrongConsensus | OutcomeCategory::ApprovedMajority
        )
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, OutcomeCategory::RejectedStrongOpposition)
    }

    /// +1 approved, -1 rejected, 0 unresolved
    pub fn direction(&self) -> i8 {
        if self.is_approved() {
            1
        } else if self.is_rejected() {
            -1
        } else {
            0
        }
    }
}

impl std::fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A vote's weighted share of the aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteContribution {
    pub voter_id: RoleId,
    pub voting_weight: f64,
    /// `vote_value * voting_weight * confidence`
    pub weighted: f64,
}

/// The terminal result of a decision. Owns its votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    decision_id: DecisionId,
    decision_type: DecisionType,
    votes: Vec<Vote>,
    contributions: Vec<VoteContribution>,
    aggregate_score: f64,
    consensus_score: f64,
    category: OutcomeCategory,
    rationale_summary: String,
}

impl DecisionOutcome {
    pub fn decision_id(&self) -> &DecisionId {
        &self.decision_id
    }

    pub fn decision_type(&self) -> DecisionType {
        self.decision_type
    }

    /// Votes in evaluation order
    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn contributions(&self) -> &[VoteContribution] {
        &self.contributions
    }

    pub fn aggregate_score(&self) -> f64 {
        self.aggregate_score
    }

    pub fn consensus_score(&self) -> f64 {
        self.consensus_score
    }

    pub fn category(&self) -> OutcomeCategory {
        self.category
    }

    pub fn rationale_summary(&self) -> &str {
        &self.rationale_summary
    }

    /// Visual vote summary (e.g., "[●●○·]")
    pub fn vote_summary(&self) -> String {
        let mut summary = String::from("[");
        for vote in &self.votes {
            summary.push(vote.symbol());
        }
        summary.push(']');
        summary
    }

    pub fn abstentions(&self) -> impl Iterator<Item = &Vote> {
        self.votes.iter().filter(|v| v.is_abstention())
    }
}

/// Agreement across raw vote values: `1 - (max - min) / 2`
///
/// Confidence plays no part. A single vote is full consensus.
pub fn consensus_score(votes: &[Vote]) -> f64 {
    let mut values = votes.iter().map(Vote::vote_value);
    let Some(first) = values.next() else {
        return 1.0;
    };
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (1.0 - (max - min) / 2.0).clamp(0.0, 1.0)
}

/// Aggregate the collected votes of a decision
///
/// Fails with [`DomainError::NoVotes`] on an empty vote set and with
/// [`DomainError::UnknownRole`] if a vote comes from a non-participant.
pub fn aggregate(
    request: &DecisionRequest,
    votes: Vec<Vote>,
    weights: &RoleWeightProfile,
) -> Result<DecisionOutcome, DomainError> {
    if votes.is_empty() {
        return Err(DomainError::NoVotes(request.decision_id.to_string()));
    }
    if let Some(stranger) = votes.iter().find(|v| !request.is_participant(v.voter_id())) {
        return Err(DomainError::UnknownRole(stranger.voter_id().to_string()));
    }

    let contributions: Vec<VoteContribution> = votes
        .iter()
        .map(|vote| {
            let voting_weight = weights.weight_for(request.decision_type, vote.voter_id());
            VoteContribution {
                voter_id: vote.voter_id().clone(),
                voting_weight,
                weighted: vote.vote_value() * voting_weight * vote.confidence(),
            }
        })
        .collect();

    // Mean, not sum, keeps the scale independent of board size; multipliers
    // above 1 can still push past ±1, hence the clamp.
    let aggregate_score = (contributions.iter().map(|c| c.weighted).sum::<f64>()
        / contributions.len() as f64)
        .clamp(-1.0, 1.0);
    let consensus_score = consensus_score(&votes);
    let category = OutcomeCategory::classify(aggregate_score, consensus_score);
    let rationale_summary =
        summarize(category, aggregate_score, consensus_score, &votes, &contributions);

    Ok(DecisionOutcome {
        decision_id: request.decision_id.clone(),
        decision_type: request.decision_type,
        votes,
        contributions,
        aggregate_score,
        consensus_score,
        category,
        rationale_summary,
    })
}

/// Cite the two votes with the largest absolute contribution; ties keep evaluation order
fn summarize(
    category: OutcomeCategory,
    aggregate_score: f64,
    consensus_score: f64,
    votes: &[Vote],
    contributions: &[VoteContribution],
) -> String {
    let mut ranked: Vec<usize> = (0..contributions.len()).collect();
    ranked.sort_by(|&a, &b| {
        contributions[b]
            .weighted
            .abs()
            .partial_cmp(&contributions[a].weighted.abs())
            .unwrap_or(Ordering::Equal)
    });

    let voices: Vec<String> = ranked
        .iter()
        .take(2)
        .map(|&i| {
            format!(
                "{} ({:+.2}): {}",
                contributions[i].voter_id,
                contributions[i].weighted,
                text::abbreviate(&text::single_line(votes[i].rationale()), 120)
            )
        })
        .collect();

    format!(
        "{}: aggregate {:+.2}, consensus {:.2} across {} vote(s). Leading voices: {}",
        category.label(),
        aggregate_score,
        consensus_score,
        votes.len(),
        voices.join("; ")
    )
}
