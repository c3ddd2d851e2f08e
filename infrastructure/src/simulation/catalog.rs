//! Profiles of locally trained models

use boardroom_domain::{
    CapacityTier, ExampleSource, FeedbackLabel, ModelVersion, RoleId, TrainingExample,
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// What a training run saw
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    pub role_id: RoleId,
    pub capacity_tier: CapacityTier,
    pub examples: usize,
    pub original_share: f64,
    /// Labeled examples that were marked positive
    pub positive_share: f64,
    /// Examples carrying any mentor or outcome label
    pub labeled_share: f64,
    /// Digest over the training set, stable for identical sets
    pub fingerprint: [u8; 32],
}

impl ModelProfile {
    /// Profile of a model that never saw any examples
    pub fn untrained(role_id: RoleId, capacity_tier: CapacityTier) -> Self {
        Self {
            role_id,
            capacity_tier,
            examples: 0,
            original_share: 1.0,
            positive_share: 0.0,
            labeled_share: 0.0,
            fingerprint: [0; 32],
        }
    }

    pub fn from_examples(
        role_id: RoleId,
        capacity_tier: CapacityTier,
        examples: &[TrainingExample],
    ) -> Self {
        if examples.is_empty() {
            return Self::untrained(role_id, capacity_tier);
        }

        let total = examples.len() as f64;
        let originals = examples
            .iter()
            .filter(|e| e.source == ExampleSource::Original)
            .count();
        let labeled: Vec<&TrainingExample> = examples
            .iter()
            .filter(|e| e.feedback_label != FeedbackLabel::Unlabeled)
            .collect();
        let positive = labeled
            .iter()
            .filter(|e| e.feedback_label == FeedbackLabel::Positive)
            .count();

        let mut hasher = blake3::Hasher::new();
        for example in examples {
            hasher.update(&example.digest());
        }

        Self {
            role_id,
            capacity_tier,
            examples: examples.len(),
            original_share: originals as f64 / total,
            positive_share: if labeled.is_empty() {
                0.0
            } else {
                positive as f64 / labeled.len() as f64
            },
            labeled_share: labeled.len() as f64 / total,
            fingerprint: *hasher.finalize().as_bytes(),
        }
    }
}

/// Shared registry of trained model profiles
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    profiles: Arc<RwLock<HashMap<ModelVersion, ModelProfile>>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, version: ModelVersion, profile: ModelProfile) {
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(version, profile);
    }

    pub fn get(&self, version: &ModelVersion) -> Option<ModelProfile> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(version)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
