//! Run Decision use case
//!
//! Fans a decision out to every participating role concurrently, then acts as
//! the collection barrier: it waits for all roles or the collection window,
//! whichever comes first, and aggregates the votes into an outcome.

use crate::ports::judgment_provider::DomainJudgmentProvider;
use crate::ports::progress::{DecisionProgressNotifier, NoProgress};
use crate::use_cases::synthesize_vote::VoteSynthesizer;
use boardroom_domain::{
    DecisionId, DecisionOutcome, DecisionRequest, DomainError, RoleId, RoleWeightProfile, Vote,
    aggregate,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur while running a decision
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunDecisionError {
    #[error("Decision {0} has no participating roles")]
    NoParticipants(DecisionId),

    #[error("No votes were collected for decision {0}")]
    NoVotes(DecisionId),

    #[error("Decision cancelled")]
    Cancelled,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RunDecisionError {
    /// Whether submitting the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RunDecisionError::NoVotes(_))
    }
}

/// Use case for running one decision end to end
pub struct RunDecisionUseCase<P: DomainJudgmentProvider + 'static> {
    synthesizer: Arc<VoteSynthesizer<P>>,
    weights: Arc<RoleWeightProfile>,
}

impl<P: DomainJudgmentProvider + 'static> RunDecisionUseCase<P> {
    pub fn new(synthesizer: Arc<VoteSynthesizer<P>>, weights: Arc<RoleWeightProfile>) -> Self {
        Self {
            synthesizer,
            weights,
        }
    }

    pub fn synthesizer(&self) -> &Arc<VoteSynthesizer<P>> {
        &self.synthesizer
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        request: &DecisionRequest,
        cancellation_token: &CancellationToken,
    ) -> Result<DecisionOutcome, RunDecisionError> {
        self.execute_with_progress(request, cancellation_token, &NoProgress)
            .await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        request: &DecisionRequest,
        cancellation_token: &CancellationToken,
        progress: &dyn DecisionProgressNotifier,
    ) -> Result<DecisionOutcome, RunDecisionError> {
        let roles = request.participating_roles().to_vec();
        if roles.is_empty() {
            return Err(RunDecisionError::NoParticipants(request.decision_id.clone()));
        }

        info!(
            "Collecting votes for {} from {} roles",
            request.decision_id,
            roles.len()
        );

        let mut collected = self
            .collect_votes(request, &roles, cancellation_token, progress)
            .await?;

        let window = self.synthesizer.params().collection_window;
        let votes: Vec<Vote> = roles
            .iter()
            .map(|role| {
                collected.remove(role).unwrap_or_else(|| {
                    let reason = format!("No vote within the {:?} collection window", window);
                    progress.on_abstention(role, &reason);
                    Vote::abstention(role.clone(), reason)
                })
            })
            .collect();
        progress.on_collection_complete(&request.decision_id);

        if votes.iter().all(Vote::is_abstention) {
            warn!("Every role abstained on {}", request.decision_id);
            return Err(RunDecisionError::NoVotes(request.decision_id.clone()));
        }

        let outcome = aggregate(request, votes, &self.weights)?;
        info!(
            "Decision {}: {} (aggregate {:+.3}, consensus {:.3})",
            outcome.decision_id(),
            outcome.category(),
            outcome.aggregate_score(),
            outcome.consensus_score()
        );
        Ok(outcome)
    }

    /// Spawn one synthesis per role and gather until done, closed or cancelled
    async fn collect_votes(
        &self,
        request: &DecisionRequest,
        roles: &[RoleId],
        cancellation_token: &CancellationToken,
        progress: &dyn DecisionProgressNotifier,
    ) -> Result<HashMap<RoleId, Vote>, RunDecisionError> {
        let shared_request = Arc::new(request.clone());
        let mut join_set = JoinSet::new();
        let mut task_roles = HashMap::with_capacity(roles.len());

        for role in roles {
            let synthesizer = Arc::clone(&self.synthesizer);
            let request = Arc::clone(&shared_request);
            let task_role = role.clone();
            let handle = join_set.spawn(async move {
                let result = synthesizer.synthesize(&request, &task_role).await;
                (task_role, result)
            });
            task_roles.insert(handle.id(), role.clone());
        }
        progress.on_collection_start(&request.decision_id, roles);

        let deadline = tokio::time::sleep(self.synthesizer.params().collection_window);
        tokio::pin!(deadline);

        let mut collected = HashMap::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    join_set.abort_all();
                    info!("Decision {} cancelled; discarding {} votes", request.decision_id, collected.len());
                    return Err(RunDecisionError::Cancelled);
                }
                _ = &mut deadline => {
                    warn!(
                        "Collection window closed for {} with {}/{} votes",
                        request.decision_id,
                        collected.len(),
                        roles.len()
                    );
                    join_set.abort_all();
                    break;
                }
                next = join_set.join_next() => next,
            };

            match next {
                None => break,
                Some(Ok((role, Ok(vote)))) => {
                    if vote.is_abstention() {
                        progress.on_abstention(&role, vote.rationale());
                    } else {
                        progress.on_vote(&vote);
                    }
                    debug!("Collected vote from {}", role);
                    collected.insert(role, vote);
                }
                Some(Ok((_, Err(e)))) => {
                    join_set.abort_all();
                    return Err(e.into());
                }
                Some(Err(e)) => {
                    let Some(role) = task_roles.get(&e.id()).cloned() else {
                        warn!("Vote task join error: {}", e);
                        continue;
                    };
                    warn!("Vote task for {} failed: {}", role, e);
                    let vote = Vote::abstention(role.clone(), format!("Vote task failed: {}", e));
                    progress.on_abstention(&role, vote.rationale());
                    collected.insert(role, vote);
                }
            }
        }

        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineParams;
    use crate::registry::AdapterFusionRegistry;
    use crate::use_cases::test_support::{ScriptedProvider, Step};
    use boardroom_domain::{DecisionType, PurposeAlignmentTable, TrackRecordBook};
    use std::sync::{Mutex, RwLock};
    use std::time::Duration;

    fn use_case(provider: ScriptedProvider, params: EngineParams) -> RunDecisionUseCase<ScriptedProvider> {
        let synthesizer = VoteSynthesizer::new(
            Arc::new(provider),
            Arc::new(AdapterFusionRegistry::default()),
            Arc::new(PurposeAlignmentTable::boardroom_default()),
            Arc::new(RwLock::new(TrackRecordBook::new())),
            params,
        );
        RunDecisionUseCase::new(
            Arc::new(synthesizer),
            Arc::new(RoleWeightProfile::boardroom_default()),
        )
    }

    fn request(roles: Vec<RoleId>) -> DecisionRequest {
        DecisionRequest::new(
            DecisionId::new("d-42"),
            DecisionType::Investment,
            "Acquire a regional logistics startup",
            roles,
        )
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl DecisionProgressNotifier for RecordingProgress {
        fn on_collection_start(&self, _decision_id: &DecisionId, roles: &[RoleId]) {
            self.events.lock().unwrap().push(format!("start:{}", roles.len()));
        }

        fn on_vote(&self, vote: &Vote) {
            self.events.lock().unwrap().push(format!("vote:{}", vote.voter_id()));
        }

        fn on_abstention(&self, role: &RoleId, _reason: &str) {
            self.events.lock().unwrap().push(format!("abstain:{}", role));
        }

        fn on_collection_complete(&self, _decision_id: &DecisionId) {
            self.events.lock().unwrap().push("complete".to_string());
        }
    }

    #[tokio::test]
    async fn test_all_roles_vote() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::score(0.9)])
            .with(RoleId::Cfo, vec![Step::score(0.85)])
            .with(RoleId::Cto, vec![Step::score(0.8)]);
        let run = use_case(provider, EngineParams::default());

        let outcome = run
            .execute(
                &request(vec![RoleId::Ceo, RoleId::Cfo, RoleId::Cto]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.votes().len(), 3);
        assert!(outcome.category().is_approved());
        assert!(outcome.votes().iter().all(|v| !v.is_abstention()));
    }

    #[tokio::test]
    async fn test_votes_follow_participant_order() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Cto, vec![Step::score(0.7)])
            .with(RoleId::Cmo, vec![Step::score(0.6)])
            .with(RoleId::Ceo, vec![Step::score(0.8)]);
        let run = use_case(provider, EngineParams::default());

        let outcome = run
            .execute(
                &request(vec![RoleId::Cto, RoleId::Cmo, RoleId::Ceo]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let voters: Vec<&RoleId> = outcome.votes().iter().map(Vote::voter_id).collect();
        assert_eq!(voters, vec![&RoleId::Cto, &RoleId::Cmo, &RoleId::Ceo]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_role_abstains_and_decision_completes() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::score(0.9)])
            .with(RoleId::Cfo, vec![Step::score(0.9)])
            .with(RoleId::Cto, vec![Step::Delay(Duration::from_secs(120), 0.9)]);
        let params = EngineParams::default().with_judgment_timeout(Duration::from_secs(5));
        let run = use_case(provider, params);

        let outcome = run
            .execute(
                &request(vec![RoleId::Ceo, RoleId::Cfo, RoleId::Cto]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let cto = &outcome.votes()[2];
        assert!(cto.is_abstention());
        assert_eq!(cto.confidence(), 0.0);
        let cto_contribution = &outcome.contributions()[2];
        assert_eq!(cto_contribution.weighted, 0.0);
        assert!(outcome.aggregate_score() > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collection_window_closes_barrier() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::score(0.9)])
            .with(RoleId::Coo, vec![Step::Delay(Duration::from_secs(8), 0.9)]);
        let params = EngineParams::default()
            .with_judgment_timeout(Duration::from_secs(30))
            .with_collection_window(Duration::from_secs(2));
        let run = use_case(provider, params);
        let progress = RecordingProgress::default();

        let outcome = run
            .execute_with_progress(
                &request(vec![RoleId::Ceo, RoleId::Coo]),
                &CancellationToken::new(),
                &progress,
            )
            .await
            .unwrap();

        assert!(outcome.votes()[1].is_abstention());
        assert!(outcome.votes()[1].rationale().contains("collection window"));
        let events = progress.events.lock().unwrap().clone();
        assert_eq!(events, vec!["start:2", "vote:ceo", "abstain:coo", "complete"]);
    }

    #[tokio::test]
    async fn test_all_roles_failing_is_no_votes() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::Fail("offline".to_string())])
            .with(RoleId::Cfo, vec![Step::Fail("offline".to_string())]);
        let run = use_case(provider, EngineParams::default().with_judgment_retries(0));

        let err = run
            .execute(&request(vec![RoleId::Ceo, RoleId::Cfo]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, RunDecisionError::NoVotes(DecisionId::new("d-42")));
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_discards_votes() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::score(0.9)])
            .with(RoleId::Cfo, vec![Step::Delay(Duration::from_secs(5), 0.9)]);
        let run = use_case(provider, EngineParams::default());
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = run
            .execute(&request(vec![RoleId::Ceo, RoleId::Cfo]), &token)
            .await
            .unwrap_err();
        assert_eq!(err, RunDecisionError::Cancelled);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_panicked_vote_task_abstains_with_its_own_reason() {
        let provider = ScriptedProvider::new()
            .with(RoleId::Ceo, vec![Step::score(0.9)])
            .with(RoleId::Cfo, vec![Step::Panic]);
        let run = use_case(provider, EngineParams::default());
        let progress = RecordingProgress::default();

        let outcome = run
            .execute_with_progress(
                &request(vec![RoleId::Ceo, RoleId::Cfo]),
                &CancellationToken::new(),
                &progress,
            )
            .await
            .unwrap();

        let cfo = &outcome.votes()[1];
        assert!(cfo.is_abstention());
        assert!(cfo.rationale().starts_with("Vote task failed"));
        assert!(!cfo.rationale().contains("collection window"));
        let events = progress.events.lock().unwrap().clone();
        assert_eq!(events.iter().filter(|e| *e == "abstain:cfo").count(), 1);
    }

    #[tokio::test]
    async fn test_no_participants() {
        let run = use_case(ScriptedProvider::new(), EngineParams::default());
        let err = run
            .execute(&request(vec![]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RunDecisionError::NoParticipants(_)));
    }

    #[tokio::test]
    async fn test_single_vote_has_full_consensus() {
        let provider = ScriptedProvider::new().with(RoleId::Cfo, vec![Step::score(0.3)]);
        let run = use_case(provider, EngineParams::default());

        let outcome = run
            .execute(&request(vec![RoleId::Cfo]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.consensus_score(), 1.0);
    }
}
