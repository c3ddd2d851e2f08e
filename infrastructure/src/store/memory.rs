//! In-process implementation of the persistent store port.
//!
//! Every record is keyed. A repeated write of an identical record is a
//! no-op; a different record under an existing key is rejected with
//! [`StoreError::Conflict`]. Nothing is ever removed.

use async_trait::async_trait;
use boardroom_application::{PersistentStore, StoreError};
use boardroom_domain::{
    AdapterFusionConfig, DatasetVersion, DatasetVersionId, DecisionId, DecisionOutcome,
    EvaluationScore, ExampleId, RoleId, TrainingExample,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct Records {
    outcomes: HashMap<DecisionId, DecisionOutcome>,
    examples: Vec<TrainingExample>,
    example_keys: HashMap<(RoleId, ExampleId), usize>,
    dataset_versions: HashMap<(RoleId, DatasetVersionId), DatasetVersion>,
    evaluations: Vec<EvaluationScore>,
    fusion_configs: HashMap<RoleId, Vec<AdapterFusionConfig>>,
}

/// Append-only in-memory store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<Records>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    // ==================== Queries ====================

    pub fn outcome_count(&self) -> usize {
        self.records().map(|r| r.outcomes.len()).unwrap_or(0)
    }

    /// Stored examples of a role in write order
    pub fn examples_for(&self, role: &RoleId) -> Vec<TrainingExample> {
        self.records()
            .map(|r| {
                r.examples
                    .iter()
                    .filter(|e| &e.role_id == role)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Dataset versions of a role ordered by version id
    pub fn dataset_versions(&self, role: &RoleId) -> Vec<DatasetVersion> {
        let mut versions: Vec<DatasetVersion> = self
            .records()
            .map(|r| {
                r.dataset_versions
                    .values()
                    .filter(|v| &v.role_id == role)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        versions.sort_by_key(|v| v.version_id);
        versions
    }

    pub fn evaluations(&self, role: &RoleId) -> Vec<EvaluationScore> {
        self.records()
            .map(|r| {
                r.evaluations
                    .iter()
                    .filter(|s| &s.role_id == role)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every fusion config written for a role, oldest first
    pub fn fusion_history(&self, role: &RoleId) -> Vec<AdapterFusionConfig> {
        self.records()
            .ok()
            .and_then(|r| r.fusion_configs.get(role).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PersistentStore for InMemoryStore {
    async fn save_outcome(&self, outcome: &DecisionOutcome) -> Result<(), StoreError> {
        let mut records = self.records()?;
        match records.outcomes.get(outcome.decision_id()) {
            Some(existing) if existing == outcome => Ok(()),
            Some(_) => Err(StoreError::Conflict(outcome.decision_id().to_string())),
            None => {
                records
                    .outcomes
                    .insert(outcome.decision_id().clone(), outcome.clone());
                Ok(())
            }
        }
    }

    async fn load_outcome(&self, id: &DecisionId) -> Result<Option<DecisionOutcome>, StoreError> {
        Ok(self.records()?.outcomes.get(id).cloned())
    }

    async fn append_examples(&self, examples: &[TrainingExample]) -> Result<(), StoreError> {
        let mut records = self.records()?;

        // Validate the whole batch first so a conflict writes nothing
        for example in examples {
            let key = (example.role_id.clone(), example.id.clone());
            if let Some(&index) = records.example_keys.get(&key)
                && records.examples[index] != *example
            {
                return Err(StoreError::Conflict(format!("{}/{}", key.0, key.1)));
            }
        }

        let mut written = 0;
        for example in examples {
            let key = (example.role_id.clone(), example.id.clone());
            if records.example_keys.contains_key(&key) {
                continue;
            }
            let index = records.examples.len();
            records.examples.push(example.clone());
            records.example_keys.insert(key, index);
            written += 1;
        }
        debug!("Stored {} of {} examples", written, examples.len());
        Ok(())
    }

    async fn save_dataset_version(&self, version: &DatasetVersion) -> Result<(), StoreError> {
        let mut records = self.records()?;
        let key = (version.role_id.clone(), version.version_id);
        match records.dataset_versions.get(&key) {
            Some(existing) if existing == version => Ok(()),
            Some(_) => Err(StoreError::Conflict(format!("{}/{}", key.0, key.1))),
            None => {
                records.dataset_versions.insert(key, version.clone());
                Ok(())
            }
        }
    }

    async fn save_evaluation(&self, score: &EvaluationScore) -> Result<(), StoreError> {
        let mut records = self.records()?;
        if !records.evaluations.contains(score) {
            records.evaluations.push(score.clone());
        }
        Ok(())
    }

    async fn save_fusion_config(&self, config: &AdapterFusionConfig) -> Result<(), StoreError> {
        let mut records = self.records()?;
        let history = records
            .fusion_configs
            .entry(config.role_id.clone())
            .or_default();
        // Re-deploying an earlier config is a new entry; repeating the latest is not
        if history.last() != Some(config) {
            history.push(config.clone());
        }
        Ok(())
    }
}
