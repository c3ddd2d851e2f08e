//! Domain Judgment Provider port
//!
//! Defines how the application layer obtains a role's expert assessment of a
//! proposal. Backends (local inference, remote API, heuristics) live in the
//! infrastructure layer.

use async_trait::async_trait;
use boardroom_domain::{AdapterFusionConfig, DecisionType, RoleId};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while obtaining a judgment
///
/// Every variant is recovered locally by the vote synthesizer as an
/// abstention; none of them fails a decision on its own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JudgmentError {
    #[error("Judgment timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid judgment: {0}")]
    InvalidResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl JudgmentError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, JudgmentError::Timeout(_))
    }
}

/// What a role is asked to judge
#[derive(Debug, Clone)]
pub struct JudgmentRequest {
    pub role_id: RoleId,
    pub proposal_text: String,
    pub decision_type: DecisionType,
    /// Adapter mix and model version that should answer
    pub adapter: AdapterFusionConfig,
}

/// A role's raw assessment
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    /// Expertise-weighted assessment in `[0, 1]`
    pub score: f64,
    /// The provider's own certainty, when it reports one
    pub confidence: Option<f64>,
    pub rationale: String,
}

impl Judgment {
    pub fn new(score: f64, rationale: impl Into<String>) -> Self {
        Self {
            score,
            confidence: None,
            rationale: rationale.into(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Gateway to a role's underlying model
///
/// Calls must be safe to retry. Implementations must not hold shared locks
/// while waiting on inference.
#[async_trait]
pub trait DomainJudgmentProvider: Send + Sync {
    async fn evaluate(&self, request: &JudgmentRequest) -> Result<Judgment, JudgmentError>;
}
