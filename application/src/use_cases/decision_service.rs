//! Decision service
//!
//! The engine's exposed surface: accepts decision requests, runs them in the
//! background, and answers outcome and role status queries. Completed
//! outcomes are persisted, fed to role track records and recorded as
//! self-learning material. Cancelled decisions leave no trace beyond the
//! cancellation event.

use crate::ports::event_sink::{EngineEvent, EngineEventSink};
use crate::ports::judgment_provider::DomainJudgmentProvider;
use crate::ports::progress::{DecisionProgressNotifier, NoProgress};
use crate::ports::store::{PersistentStore, StoreError};
use crate::registry::{AdapterFusionRegistry, LearningLedger};
use crate::use_cases::run_decision::{RunDecisionError, RunDecisionUseCase};
use boardroom_domain::{
    CapacityTier, DecisionId, DecisionOutcome, DecisionRequest, EvaluationScore, FeedbackLabel,
    LearningPhase, ModelVersion, NewExample, Provenance, RoleId, TrackRecordBook, TrainingExample,
    Vote,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecisionServiceError {
    #[error("Decision {0} was already submitted")]
    Duplicate(DecisionId),

    #[error("Decision {0} has no participating roles")]
    NoParticipants(DecisionId),

    #[error("Unknown decision: {0}")]
    UnknownDecision(DecisionId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a submitted decision currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionStatus {
    Pending,
    Completed(DecisionOutcome),
    Failed(String),
    Cancelled,
}

impl DecisionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, DecisionStatus::Pending)
    }

    pub fn outcome(&self) -> Option<&DecisionOutcome> {
        match self {
            DecisionStatus::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Snapshot of one role's model and learning state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleStatus {
    pub role_id: RoleId,
    pub capacity_tier: CapacityTier,
    pub active_model_version: ModelVersion,
    pub last_evaluation_score: Option<EvaluationScore>,
    pub phase: LearningPhase,
    pub last_fault: Option<String>,
    pub original_examples: usize,
    pub self_learning_examples: usize,
    pub dataset_versions: usize,
}

struct Tracked {
    status: watch::Sender<DecisionStatus>,
    token: CancellationToken,
    /// Set once the outcome is being recorded; cancellation is refused from then on
    committed: bool,
}

struct ServiceInner<P: DomainJudgmentProvider + 'static> {
    run: RunDecisionUseCase<P>,
    store: Arc<dyn PersistentStore>,
    events: Arc<dyn EngineEventSink>,
    ledger: Arc<LearningLedger>,
    registry: Arc<AdapterFusionRegistry>,
    track_records: Arc<RwLock<TrackRecordBook>>,
    decisions: Mutex<HashMap<DecisionId, Tracked>>,
}

/// Asynchronous decision front door; cheap to clone
pub struct DecisionService<P: DomainJudgmentProvider + 'static> {
    inner: Arc<ServiceInner<P>>,
}

impl<P: DomainJudgmentProvider + 'static> Clone for DecisionService<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: DomainJudgmentProvider + 'static> DecisionService<P> {
    pub fn new(
        run: RunDecisionUseCase<P>,
        store: Arc<dyn PersistentStore>,
        events: Arc<dyn EngineEventSink>,
        ledger: Arc<LearningLedger>,
        registry: Arc<AdapterFusionRegistry>,
        track_records: Arc<RwLock<TrackRecordBook>>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                run,
                store,
                events,
                ledger,
                registry,
                track_records,
                decisions: Mutex::new(HashMap::new()),
            }),
        }
    }

    // ==================== Operations ====================

    /// Accept a request and start collecting votes in the background
    pub fn submit_decision(&self, request: DecisionRequest) -> Result<DecisionId, DecisionServiceError> {
        self.submit_with_progress(request, Arc::new(NoProgress))
    }

    /// Like [`submit_decision`](Self::submit_decision), reporting each vote as it arrives
    pub fn submit_with_progress(
        &self,
        request: DecisionRequest,
        progress: Arc<dyn DecisionProgressNotifier>,
    ) -> Result<DecisionId, DecisionServiceError> {
        let decision_id = request.decision_id.clone();
        if request.participating_roles().is_empty() {
            return Err(DecisionServiceError::NoParticipants(decision_id));
        }

        let token = CancellationToken::new();
        {
            let mut decisions = self.inner.decisions.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = decisions.get(&decision_id) {
                // A failed run may be resubmitted under the same id
                if !matches!(*existing.status.borrow(), DecisionStatus::Failed(_)) {
                    return Err(DecisionServiceError::Duplicate(decision_id));
                }
            }
            let (status, _) = watch::channel(DecisionStatus::Pending);
            decisions.insert(
                decision_id.clone(),
                Tracked {
                    status,
                    token: token.clone(),
                    committed: false,
                },
            );
        }

        info!("Accepted decision {}", decision_id);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner
                .run
                .execute_with_progress(&request, &token, progress.as_ref())
                .await;
            let status = inner.finish(&request, result, &token).await;
            inner.set_status(&request.decision_id, status);
        });

        Ok(decision_id)
    }

    /// Current status; decisions from earlier runs are looked up in the store
    pub async fn get_outcome(&self, id: &DecisionId) -> Result<DecisionStatus, DecisionServiceError> {
        if let Some(status) = self.inner.status_of(id) {
            return Ok(status);
        }
        match self.inner.store.load_outcome(id).await? {
            Some(outcome) => Ok(DecisionStatus::Completed(outcome)),
            None => Err(DecisionServiceError::UnknownDecision(id.clone())),
        }
    }

    /// Wait until the decision leaves `Pending`
    pub async fn wait_for_outcome(&self, id: &DecisionId) -> Result<DecisionStatus, DecisionServiceError> {
        let receiver = {
            let decisions = self.inner.decisions.lock().unwrap_or_else(PoisonError::into_inner);
            decisions.get(id).map(|tracked| tracked.status.subscribe())
        };
        let Some(mut receiver) = receiver else {
            return self.get_outcome(id).await;
        };

        let settled = receiver
            .wait_for(|status| !status.is_pending())
            .await
            .map(|status| status.clone());
        match settled {
            Ok(status) => Ok(status),
            // Sender dropped only if the entry was replaced by a resubmission
            Err(_) => self.get_outcome(id).await,
        }
    }

    /// Cancel a pending decision; returns whether anything was cancelled.
    ///
    /// Once votes have been aggregated and the outcome is being recorded the
    /// decision can no longer be cancelled.
    pub fn cancel(&self, id: &DecisionId) -> bool {
        let decisions = self.inner.decisions.lock().unwrap_or_else(PoisonError::into_inner);
        match decisions.get(id) {
            Some(tracked) if !tracked.committed && tracked.status.borrow().is_pending() => {
                tracked.token.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn get_role_status(&self, role: &RoleId) -> Option<RoleStatus> {
        let config = self.inner.registry.get(role)?;
        let learning = self.inner.ledger.with_role(role, |state| {
            (
                state.evaluations.last().map(|s| s.score.clone()),
                state.lifecycle.phase(),
                state.lifecycle.last_fault().map(str::to_string),
                state.corpus.original_len(),
                state.corpus.self_learning_len(),
                state.versions.len(),
            )
        });
        let (last_evaluation_score, phase, last_fault, original, self_learning, versions) =
            learning.unwrap_or((None, LearningPhase::Idle, None, 0, 0, 0));

        Some(RoleStatus {
            role_id: role.clone(),
            capacity_tier: config.capacity_tier,
            active_model_version: config.active_model_version.clone(),
            last_evaluation_score,
            phase,
            last_fault,
            original_examples: original,
            self_learning_examples: self_learning,
            dataset_versions: versions,
        })
    }

    pub fn role_statuses(&self) -> Vec<RoleStatus> {
        self.inner
            .registry
            .roles()
            .iter()
            .filter_map(|role| self.get_role_status(role))
            .collect()
    }
}

impl<P: DomainJudgmentProvider + 'static> ServiceInner<P> {
    fn status_of(&self, id: &DecisionId) -> Option<DecisionStatus> {
        let decisions = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);
        decisions.get(id).map(|tracked| tracked.status.borrow().clone())
    }

    fn set_status(&self, id: &DecisionId, status: DecisionStatus) {
        let decisions = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tracked) = decisions.get(id) {
            tracked.status.send_replace(status);
        }
    }

    /// Mark the decision as committed unless a cancellation got there first
    fn commit(&self, id: &DecisionId, token: &CancellationToken) -> bool {
        let mut decisions = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            return false;
        }
        if let Some(tracked) = decisions.get_mut(id) {
            tracked.committed = true;
        }
        true
    }

    fn cancelled(&self, decision_id: &DecisionId) -> DecisionStatus {
        self.events.emit(&EngineEvent::DecisionCancelled {
            decision_id: decision_id.clone(),
        });
        DecisionStatus::Cancelled
    }

    async fn finish(
        &self,
        request: &DecisionRequest,
        result: Result<DecisionOutcome, RunDecisionError>,
        token: &CancellationToken,
    ) -> DecisionStatus {
        let decision_id = &request.decision_id;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(RunDecisionError::Cancelled) => return self.cancelled(decision_id),
            Err(e) => {
                warn!("Decision {} failed: {}", decision_id, e);
                return self.fail(decision_id, e.to_string());
            }
        };

        if !self.commit(decision_id, token) {
            info!("Decision {} cancelled after aggregation; discarding outcome", decision_id);
            return self.cancelled(decision_id);
        }
        if let Err(e) = self.store.save_outcome(&outcome).await {
            error!("Could not persist outcome of {}: {}", decision_id, e);
            return self.fail(decision_id, e.to_string());
        }

        self.track_records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(&outcome);

        let examples = self.record_feedback(request, &outcome);
        if !examples.is_empty()
            && let Err(e) = self.store.append_examples(&examples).await
        {
            warn!("Could not persist feedback examples of {}: {}", decision_id, e);
        }

        self.events.emit(&EngineEvent::outcome_created(&outcome));
        DecisionStatus::Completed(outcome)
    }

    fn fail(&self, decision_id: &DecisionId, reason: String) -> DecisionStatus {
        self.events.emit(&EngineEvent::DecisionFailed {
            decision_id: decision_id.clone(),
            reason: reason.clone(),
        });
        DecisionStatus::Failed(reason)
    }

    /// One self-learning example per non-abstaining vote
    fn record_feedback(&self, request: &DecisionRequest, outcome: &DecisionOutcome) -> Vec<TrainingExample> {
        let direction = outcome.category().direction();
        let situation = request.situation_text();

        outcome
            .votes()
            .iter()
            .filter(|vote| !vote.is_abstention())
            .filter_map(|vote| {
                let example = NewExample::new(situation.clone(), vote.rationale())
                    .with_label(feedback_label(vote, direction))
                    .with_provenance(Provenance::now().with_decision(request.decision_id.clone()));
                self.ledger.append_self_learning(vote.voter_id(), example)
            })
            .collect()
    }
}

/// Agreement of a vote with the outcome direction
fn feedback_label(vote: &Vote, direction: i8) -> FeedbackLabel {
    match direction {
        1 if vote.is_approval() => FeedbackLabel::Positive,
        -1 if vote.is_rejection() => FeedbackLabel::Positive,
        1 if vote.is_rejection() => FeedbackLabel::Negative,
        -1 if vote.is_approval() => FeedbackLabel::Negative,
        _ => FeedbackLabel::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineParams;
    use crate::use_cases::synthesize_vote::VoteSynthesizer;
    use crate::use_cases::test_support::{MemoryStore, RecordingSink, ScriptedProvider, Step};
    use boardroom_domain::{
        AdapterFusionConfig, DecisionType, ExampleSource, PurposeAlignmentTable, RoleWeightProfile,
    };
    use std::time::Duration;

    struct Harness {
        service: DecisionService<ScriptedProvider>,
        store: Arc<MemoryStore>,
        sink: Arc<RecordingSink>,
        ledger: Arc<LearningLedger>,
        track_records: Arc<RwLock<TrackRecordBook>>,
    }

    fn harness(provider: ScriptedProvider) -> Harness {
        let roles = vec![RoleId::Ceo, RoleId::Cfo, RoleId::Cto];
        let registry = Arc::new(AdapterFusionRegistry::new(
            roles.iter().cloned().map(AdapterFusionConfig::baseline),
        ));
        let ledger = Arc::new(LearningLedger::new(roles));
        let track_records = Arc::new(RwLock::new(TrackRecordBook::new()));
        let synthesizer = VoteSynthesizer::new(
            Arc::new(provider),
            Arc::clone(&registry),
            Arc::new(PurposeAlignmentTable::boardroom_default()),
            Arc::clone(&track_records),
            EngineParams::default(),
        );
        let run = RunDecisionUseCase::new(
            Arc::new(synthesizer),
            Arc::new(RoleWeightProfile::boardroom_default()),
        );
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::new());
        let service = DecisionService::new(
            run,
            Arc::clone(&store) as Arc<dyn PersistentStore>,
            Arc::clone(&sink) as Arc<dyn EngineEventSink>,
            Arc::clone(&ledger),
            registry,
            Arc::clone(&track_records),
        );

        Harness {
            service,
            store,
            sink,
            ledger,
            track_records,
        }
    }

    fn request(id: &str) -> DecisionRequest {
        DecisionRequest::new(
            DecisionId::new(id),
            DecisionType::Strategic,
            "Enter the Nordic market",
            vec![RoleId::Ceo, RoleId::Cfo, RoleId::Cto],
        )
    }

    fn approving() -> ScriptedProvider {
        ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::score(0.9)])
            .with(RoleId::Cfo, vec![Step::score(0.85)])
            .with(RoleId::Cto, vec![Step::score(0.05)])
    }

    #[tokio::test]
    async fn test_submit_then_wait() {
        let h = harness(approving());
        let id = h.service.submit_decision(request("d-1")).unwrap();

        let status = h.service.wait_for_outcome(&id).await.unwrap();
        let outcome = status.outcome().unwrap();
        assert!(outcome.category().is_approved());
        assert_eq!(h.sink.types(), vec!["outcome_created"]);
        assert!(h.store.outcomes.lock().unwrap().contains_key(&id));
    }

    #[derive(Default)]
    struct CountingProgress {
        votes: Mutex<usize>,
        completed: Mutex<bool>,
    }

    impl DecisionProgressNotifier for CountingProgress {
        fn on_collection_start(&self, _decision_id: &DecisionId, _roles: &[RoleId]) {}
        fn on_vote(&self, _vote: &Vote) {
            *self.votes.lock().unwrap() += 1;
        }
        fn on_abstention(&self, _role: &RoleId, _reason: &str) {}
        fn on_collection_complete(&self, _decision_id: &DecisionId) {
            *self.completed.lock().unwrap() = true;
        }
    }

    #[tokio::test]
    async fn test_submit_with_progress_reports_votes() {
        let h = harness(approving());
        let progress = Arc::new(CountingProgress::default());
        let id = h
            .service
            .submit_with_progress(request("d-p"), Arc::clone(&progress) as Arc<dyn DecisionProgressNotifier>)
            .unwrap();

        let status = h.service.wait_for_outcome(&id).await.unwrap();
        assert!(status.outcome().is_some());
        assert_eq!(*progress.votes.lock().unwrap(), 3);
        assert!(*progress.completed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_outcome_feeds_learning_and_track_records() {
        let h = harness(approving());
        let id = h.service.submit_decision(request("d-2")).unwrap();
        h.service.wait_for_outcome(&id).await.unwrap();

        let ceo = h
            .ledger
            .with_role(&RoleId::Ceo, |s| s.corpus.self_learning().to_vec())
            .unwrap();
        assert_eq!(ceo.len(), 1);
        assert_eq!(ceo[0].source, ExampleSource::SelfLearning);
        assert_eq!(ceo[0].feedback_label, FeedbackLabel::Positive);
        assert_eq!(ceo[0].provenance.decision_id.as_ref(), Some(&id));

        let cto = h
            .ledger
            .with_role(&RoleId::Cto, |s| s.corpus.self_learning().to_vec())
            .unwrap();
        assert_eq!(cto[0].feedback_label, FeedbackLabel::Negative);

        assert_eq!(h.store.examples.lock().unwrap().len(), 3);
        let records = h.track_records.read().unwrap();
        assert_eq!(records.record(&RoleId::Ceo).agreed, 1);
        assert_eq!(records.record(&RoleId::Cto).counted, 1);
        assert_eq!(records.record(&RoleId::Cto).agreed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_votes() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::Delay(Duration::from_secs(5), 0.9)])
            .with(RoleId::Cfo, vec![Step::score(0.9)])
            .with(RoleId::Cto, vec![Step::score(0.9)]);
        let h = harness(provider);
        let id = h.service.submit_decision(request("d-3")).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.service.cancel(&id));

        let status = h.service.wait_for_outcome(&id).await.unwrap();
        assert_eq!(status, DecisionStatus::Cancelled);
        assert!(!h.service.cancel(&id));
        assert_eq!(h.sink.types(), vec!["decision_cancelled"]);
        assert!(h.store.outcomes.lock().unwrap().is_empty());
        assert_eq!(
            h.ledger.with_role(&RoleId::Cfo, |s| s.corpus.self_learning_len()),
            Some(0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_refused_once_outcome_is_recorded() {
        let h = harness(approving());
        h.store.set_outcome_delay(Duration::from_secs(3));
        let id = h.service.submit_decision(request("d-slow")).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!h.service.cancel(&id));

        let status = h.service.wait_for_outcome(&id).await.unwrap();
        assert!(status.outcome().is_some());
        assert_eq!(h.sink.types(), vec!["outcome_created"]);
        assert_eq!(
            h.ledger.with_role(&RoleId::Ceo, |s| s.corpus.self_learning_len()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_cancellation_seen_after_aggregation_discards_outcome() {
        let h = harness(approving());
        let request = request("d-late");
        let outcome = h
            .service
            .inner
            .run
            .execute(&request, &CancellationToken::new())
            .await
            .unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let status = h.service.inner.finish(&request, Ok(outcome), &token).await;

        assert_eq!(status, DecisionStatus::Cancelled);
        assert_eq!(h.sink.types(), vec!["decision_cancelled"]);
        assert!(h.store.outcomes.lock().unwrap().is_empty());
        assert_eq!(
            h.ledger.with_role(&RoleId::Ceo, |s| s.corpus.self_learning_len()),
            Some(0)
        );
        assert_eq!(h.track_records.read().unwrap().record(&RoleId::Ceo).counted, 0);
    }

    #[tokio::test]
    async fn test_no_votes_fails_and_can_be_resubmitted() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::Fail("down".to_string())])
            .with(RoleId::Cfo, vec![Step::Fail("down".to_string())])
            .with(RoleId::Cto, vec![Step::Fail("down".to_string())]);
        let h = harness(provider);
        let id = h.service.submit_decision(request("d-4")).unwrap();

        let status = h.service.wait_for_outcome(&id).await.unwrap();
        assert!(matches!(status, DecisionStatus::Failed(_)));
        assert_eq!(h.sink.types(), vec!["decision_failed"]);

        assert!(h.service.submit_decision(request("d-4")).is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_submission_rejected() {
        let h = harness(approving());
        let id = h.service.submit_decision(request("d-5")).unwrap();
        assert_eq!(
            h.service.submit_decision(request("d-5")).unwrap_err(),
            DecisionServiceError::Duplicate(id.clone())
        );
        h.service.wait_for_outcome(&id).await.unwrap();
        assert!(h.service.submit_decision(request("d-5")).is_err());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_failed() {
        let h = harness(approving());
        h.store.set_unavailable(true);
        let id = h.service.submit_decision(request("d-6")).unwrap();

        let status = h.service.wait_for_outcome(&id).await.unwrap();
        match status {
            DecisionStatus::Failed(reason) => assert!(reason.contains("unavailable")),
            other => panic!("unexpected status: {:?}", other),
        }
        assert_eq!(
            h.ledger.with_role(&RoleId::Ceo, |s| s.corpus.self_learning_len()),
            Some(0)
        );
    }

    #[tokio::test]
    async fn test_get_outcome_falls_back_to_store() {
        let h = harness(approving());
        let unknown = DecisionId::new("never-submitted");
        assert_eq!(
            h.service.get_outcome(&unknown).await.unwrap_err(),
            DecisionServiceError::UnknownDecision(unknown)
        );
    }

    #[tokio::test]
    async fn test_role_status() {
        let h = harness(approving());
        let status = h.service.get_role_status(&RoleId::Cfo).unwrap();
        assert_eq!(status.capacity_tier, CapacityTier::Baseline);
        assert_eq!(status.active_model_version.as_str(), "cfo-baseline-v0");
        assert_eq!(status.phase, LearningPhase::Idle);
        assert!(status.last_evaluation_score.is_none());
        assert!(h.service.get_role_status(&RoleId::Cmo).is_none());
        assert_eq!(h.service.role_statuses().len(), 3);
    }

    #[test]
    fn test_feedback_label() {
        let approve = Vote::new(RoleId::Ceo, 0.8, 0.7, "yes", 0.9, 0.8);
        let reject = Vote::new(RoleId::Ceo, -0.8, 0.7, "no", 0.1, 0.8);
        assert_eq!(feedback_label(&approve, 1), FeedbackLabel::Positive);
        assert_eq!(feedback_label(&reject, 1), FeedbackLabel::Negative);
        assert_eq!(feedback_label(&reject, -1), FeedbackLabel::Positive);
        assert_eq!(feedback_label(&approve, 0), FeedbackLabel::Neutral);
    }
}
