//! Local training pipeline
//!
//! Jobs finish after a fixed simulated training time. Completion registers
//! a profile of the training set in the shared [`ModelCatalog`].

use super::catalog::{ModelCatalog, ModelProfile};
use async_trait::async_trait;
use boardroom_application::{
    TrainingJobError, TrainingJobId, TrainingJobRequest, TrainingJobStatus, TrainingPipeline,
};
use boardroom_domain::{CapacityTier, ModelVersion, RoleId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug)]
struct Job {
    version: ModelVersion,
    profile: ModelProfile,
    ready_at: Instant,
}

#[derive(Debug, Default)]
struct JobBook {
    jobs: HashMap<TrainingJobId, Job>,
    /// Last version number handed out per role and tier
    versions: HashMap<(RoleId, CapacityTier), u64>,
    submitted: u64,
}

pub struct LocalTrainingPipeline {
    catalog: ModelCatalog,
    training_time: Duration,
    book: Mutex<JobBook>,
}

impl LocalTrainingPipeline {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self {
            catalog,
            training_time: Duration::ZERO,
            book: Mutex::new(JobBook::default()),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_training_time(mut self, training_time: Duration) -> Self {
        self.training_time = training_time;
        self
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }
}

#[async_trait]
impl TrainingPipeline for LocalTrainingPipeline {
    async fn submit(&self, request: TrainingJobRequest) -> Result<TrainingJobId, TrainingJobError> {
        if request.examples.is_empty() {
            return Err(TrainingJobError::Rejected("empty training set".to_string()));
        }
        if let Some(foreign) = request.examples.iter().find(|e| e.role_id != request.role_id) {
            return Err(TrainingJobError::Rejected(format!(
                "example {} belongs to {}, not {}",
                foreign.id, foreign.role_id, request.role_id
            )));
        }

        let profile = ModelProfile::from_examples(
            request.role_id.clone(),
            request.capacity_tier,
            &request.examples,
        );

        let mut book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        book.submitted += 1;
        let job_id = TrainingJobId(format!("job-{}", book.submitted));
        let n = book
            .versions
            .entry((request.role_id.clone(), request.capacity_tier))
            .or_insert(0);
        *n += 1;
        let version = ModelVersion::new(format!(
            "{}-{}-v{}",
            request.role_id, request.capacity_tier, n
        ));

        info!(
            "Training {} from {} on {} examples ({})",
            version,
            request.base_model,
            request.examples.len(),
            request.dataset_version
        );
        book.jobs.insert(
            job_id.clone(),
            Job {
                version,
                profile,
                ready_at: Instant::now() + self.training_time,
            },
        );
        Ok(job_id)
    }

    async fn poll(&self, job: &TrainingJobId) -> Result<TrainingJobStatus, TrainingJobError> {
        let book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = book
            .jobs
            .get(job)
            .ok_or_else(|| TrainingJobError::UnknownJob(job.to_string()))?;

        if Instant::now() < entry.ready_at {
            debug!("{} still training", entry.version);
            return Ok(TrainingJobStatus::Running);
        }
        if self.catalog.get(&entry.version).is_none() {
            self.catalog
                .insert(entry.version.clone(), entry.profile.clone());
        }
        Ok(TrainingJobStatus::Completed(entry.version.clone()))
    }
}
