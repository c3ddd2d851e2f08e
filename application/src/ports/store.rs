//! Persistent store port
//!
//! Durable append-only storage. Writes are at-least-once; a repeated write
//! of an existing key must be accepted without creating a second record.

use async_trait::async_trait;
use boardroom_domain::{
    AdapterFusionConfig, DatasetVersion, DecisionId, DecisionOutcome, EvaluationScore,
    TrainingExample,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Conflicting write for key {0}")]
    Conflict(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn save_outcome(&self, outcome: &DecisionOutcome) -> Result<(), StoreError>;

    async fn load_outcome(&self, id: &DecisionId) -> Result<Option<DecisionOutcome>, StoreError>;

    async fn append_examples(&self, examples: &[TrainingExample]) -> Result<(), StoreError>;

    async fn save_dataset_version(&self, version: &DatasetVersion) -> Result<(), StoreError>;

    async fn save_evaluation(&self, score: &EvaluationScore) -> Result<(), StoreError>;

    async fn save_fusion_config(&self, config: &AdapterFusionConfig) -> Result<(), StoreError>;
}
