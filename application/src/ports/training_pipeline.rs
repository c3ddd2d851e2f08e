//! ML Training Pipeline port

use async_trait::async_trait;
use boardroom_domain::{CapacityTier, DatasetVersionId, ModelVersion, RoleId, TrainingExample};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainingJobError {
    #[error("Training job rejected: {0}")]
    Rejected(String),

    #[error("Unknown training job: {0}")]
    UnknownJob(String),

    #[error("Training job failed: {0}")]
    JobFailed(String),

    #[error("Training job did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Other error: {0}")]
    Other(String),
}

/// Handle to a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrainingJobId(pub String);

impl std::fmt::Display for TrainingJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct TrainingJobRequest {
    pub role_id: RoleId,
    /// Tier the job trains for
    pub capacity_tier: CapacityTier,
    /// Model the adapters are fine-tuned from
    pub base_model: ModelVersion,
    pub dataset_version: DatasetVersionId,
    /// Fully materialized blended example set
    pub examples: Vec<TrainingExample>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainingJobStatus {
    Running,
    Completed(ModelVersion),
    Failed(String),
}

/// External retraining collaborator
///
/// The engine only builds the example set and waits for a completion
/// signal; training itself happens elsewhere.
#[async_trait]
pub trait TrainingPipeline: Send + Sync {
    async fn submit(&self, request: TrainingJobRequest) -> Result<TrainingJobId, TrainingJobError>;

    async fn poll(&self, job: &TrainingJobId) -> Result<TrainingJobStatus, TrainingJobError>;
}
