//! Evaluation harness port

use async_trait::async_trait;
use boardroom_domain::{CapacityTier, EvaluationScore, ModelVersion, RoleId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Evaluation harness unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown model version: {0}")]
    UnknownModel(String),

    #[error("Other error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub role_id: RoleId,
    pub model_version: ModelVersion,
    pub capacity_tier: CapacityTier,
    /// Situations to score on; empty means the harness's own suite
    pub probes: Vec<String>,
}

/// Scores a model version on role fidelity, clarity, conflict and guardrails
#[async_trait]
pub trait EvaluationHarness: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationScore, EvaluationError>;
}
