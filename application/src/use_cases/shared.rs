//! Shared utilities for use cases.
//!
//! Training job polling and bounded judgment calls used by both the
//! self-learning loop and the capacity upgrade manager.

use crate::ports::judgment_provider::{
    DomainJudgmentProvider, Judgment, JudgmentError, JudgmentRequest,
};
use crate::ports::training_pipeline::{
    TrainingJobError, TrainingJobId, TrainingJobStatus, TrainingPipeline,
};
use boardroom_domain::{AdapterFusionConfig, GeneratedSituation, ModelVersion};
use std::time::Duration;
use tracing::debug;

/// Poll a submitted job until it finishes or `timeout` elapses.
pub(crate) async fn await_training<T: TrainingPipeline + ?Sized>(
    pipeline: &T,
    job: &TrainingJobId,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<ModelVersion, TrainingJobError> {
    let polling = async {
        loop {
            match pipeline.poll(job).await? {
                TrainingJobStatus::Completed(version) => return Ok(version),
                TrainingJobStatus::Failed(reason) => return Err(TrainingJobError::JobFailed(reason)),
                TrainingJobStatus::Running => {
                    debug!("Training job {} still running", job);
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    };

    match tokio::time::timeout(timeout, polling).await {
        Ok(result) => result,
        Err(_) => Err(TrainingJobError::Timeout(timeout)),
    }
}

/// Answer a generated situation on a given adapter under a timeout.
pub(crate) async fn answer_situation<P: DomainJudgmentProvider + ?Sized>(
    provider: &P,
    adapter: &AdapterFusionConfig,
    situation: &GeneratedSituation,
    timeout: Duration,
) -> Result<Judgment, JudgmentError> {
    let request = JudgmentRequest {
        role_id: adapter.role_id.clone(),
        proposal_text: situation.text.clone(),
        decision_type: situation.decision_type,
        adapter: adapter.clone(),
    };

    let judgment = tokio::time::timeout(timeout, provider.evaluate(&request))
        .await
        .map_err(|_| JudgmentError::Timeout(timeout))??;
    if !judgment.score.is_finite() {
        return Err(JudgmentError::InvalidResponse(format!(
            "score {} is not a number",
            judgment.score
        )));
    }
    Ok(judgment)
}

/// Response text recorded for an answered situation
pub(crate) fn response_text(judgment: &Judgment) -> String {
    format!("{} (judgment {:.2})", judgment.rationale, judgment.score)
}
