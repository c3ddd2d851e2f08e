//! Synthesize Vote use case
//!
//! Turns one role's domain judgment into a [`Vote`]. The provider call is the
//! only step that waits on external latency; it runs under a per-call timeout
//! and a judgment failure degrades into an abstention instead of failing the
//! decision.

use crate::config::EngineParams;
use crate::ports::judgment_provider::{
    DomainJudgmentProvider, Judgment, JudgmentError, JudgmentRequest,
};
use crate::registry::AdapterFusionRegistry;
use boardroom_domain::{
    AdapterFusionConfig, DecisionRequest, DomainError, PurposeAlignmentTable, RoleId,
    SynthesisInputs, TrackRecordBook, Vote, synthesize,
};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while synthesizing a vote
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesizeVoteError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Role {role} unavailable: {source}")]
    RoleUnavailable {
        role: RoleId,
        #[source]
        source: JudgmentError,
    },
}

/// Use case for synthesizing a single role's vote
pub struct VoteSynthesizer<P: DomainJudgmentProvider + 'static> {
    provider: Arc<P>,
    registry: Arc<AdapterFusionRegistry>,
    alignment: Arc<PurposeAlignmentTable>,
    track_records: Arc<RwLock<TrackRecordBook>>,
    params: EngineParams,
}

impl<P: DomainJudgmentProvider + 'static> VoteSynthesizer<P> {
    pub fn new(
        provider: Arc<P>,
        registry: Arc<AdapterFusionRegistry>,
        alignment: Arc<PurposeAlignmentTable>,
        track_records: Arc<RwLock<TrackRecordBook>>,
        params: EngineParams,
    ) -> Self {
        Self {
            provider,
            registry,
            alignment,
            track_records,
            params,
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Synthesize a vote, recovering any judgment failure as an abstention
    pub async fn synthesize(
        &self,
        request: &DecisionRequest,
        role: &RoleId,
    ) -> Result<Vote, DomainError> {
        match self.try_synthesize(request, role).await {
            Ok(vote) => Ok(vote),
            Err(SynthesizeVoteError::RoleUnavailable { role, source }) => Ok(Vote::abstention(
                role,
                format!("Judgment unavailable: {}", source),
            )),
            Err(SynthesizeVoteError::Domain(e)) => Err(e),
        }
    }

    /// Synthesize a vote, surfacing judgment failures
    pub async fn try_synthesize(
        &self,
        request: &DecisionRequest,
        role: &RoleId,
    ) -> Result<Vote, SynthesizeVoteError> {
        if !request.is_participant(role) {
            return Err(DomainError::UnknownRole(role.to_string()).into());
        }

        let adapter = self.adapter_for(role);
        let judgment_request = JudgmentRequest {
            role_id: role.clone(),
            proposal_text: request.proposal_text.clone(),
            decision_type: request.decision_type,
            adapter,
        };

        let judgment = self
            .judge(&judgment_request)
            .await
            .map_err(|source| SynthesizeVoteError::RoleUnavailable {
                role: role.clone(),
                source,
            })?;

        let historical_accuracy = self
            .track_records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .accuracy(role);

        let inputs = SynthesisInputs {
            domain_judgment_score: judgment.score,
            provider_confidence: judgment.confidence,
            purpose_alignment_score: self.alignment.score_for(role, request.decision_type),
            historical_accuracy,
            judgment_rationale: judgment.rationale,
        };
        let vote = synthesize(role.clone(), &inputs);
        debug!(
            "{} voted {:+.2} (confidence {:.2}) on {}",
            role,
            vote.vote_value(),
            vote.confidence(),
            request.decision_id
        );
        Ok(vote)
    }

    /// Active adapter for the role; unregistered roles answer on the baseline
    fn adapter_for(&self, role: &RoleId) -> AdapterFusionConfig {
        self.registry
            .get(role)
            .map(|config| config.as_ref().clone())
            .unwrap_or_else(|| AdapterFusionConfig::baseline(role.clone()))
    }

    /// One judgment under the per-call timeout.
    ///
    /// Non-timeout failures are retried inside the same time budget; the
    /// timeout itself ends the attempt.
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, JudgmentError> {
        let timeout = self.params.judgment_timeout;
        let retries = self.params.judgment_retries;
        let attempts = async {
            let mut attempt = 0;
            loop {
                match self.provider.evaluate(request).await {
                    Ok(judgment) => return validate(judgment),
                    Err(e) if attempt < retries => {
                        attempt += 1;
                        warn!(
                            "Judgment for {} failed (attempt {}/{}): {}",
                            request.role_id,
                            attempt,
                            retries + 1,
                            e
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        match tokio::time::timeout(timeout, attempts).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Judgment for {} timed out after {:?}", request.role_id, timeout);
                Err(JudgmentError::Timeout(timeout))
            }
        }
    }
}

fn validate(judgment: Judgment) -> Result<Judgment, JudgmentError> {
    if !judgment.score.is_finite() {
        return Err(JudgmentError::InvalidResponse(format!(
            "score {} is not a number",
            judgment.score
        )));
    }
    Ok(judgment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{ScriptedProvider, Step};
    use boardroom_domain::{DecisionId, DecisionType};
    use std::time::Duration;

    fn request(roles: Vec<RoleId>) -> DecisionRequest {
        DecisionRequest::new(
            DecisionId::new("d-1"),
            DecisionType::Financial,
            "Refinance the credit line",
            roles,
        )
    }

    fn synthesizer(provider: ScriptedProvider, params: EngineParams) -> VoteSynthesizer<ScriptedProvider> {
        VoteSynthesizer::new(
            Arc::new(provider),
            Arc::new(AdapterFusionRegistry::new([AdapterFusionConfig::baseline(RoleId::Cfo)])),
            Arc::new(PurposeAlignmentTable::boardroom_default()),
            Arc::new(RwLock::new(TrackRecordBook::new())),
            params,
        )
    }

    #[tokio::test]
    async fn test_strong_judgment_approves() {
        let provider = ScriptedProvider::new().with(RoleId::Cfo, vec![Step::score(0.9)]);
        let synth = synthesizer(provider, EngineParams::default());

        let vote = synth.synthesize(&request(vec![RoleId::Cfo]), &RoleId::Cfo).await.unwrap();
        assert!(vote.is_approval());
        assert!(vote.confidence() > 0.0);
        assert_eq!(vote.domain_judgment_score(), 0.9);
    }

    #[tokio::test]
    async fn test_non_participant_is_rejected() {
        let synth = synthesizer(ScriptedProvider::new(), EngineParams::default());
        let err = synth
            .synthesize(&request(vec![RoleId::Cfo]), &RoleId::Cto)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::UnknownRole("cto".to_string()));
    }

    #[tokio::test]
    async fn test_failure_is_retried() {
        let provider = ScriptedProvider::new().with(
            RoleId::Cfo,
            vec![Step::Fail("connection reset".to_string()), Step::score(0.05)],
        );
        let synth = synthesizer(provider, EngineParams::default().with_judgment_retries(1));

        let vote = synth.synthesize(&request(vec![RoleId::Cfo]), &RoleId::Cfo).await.unwrap();
        assert!(vote.is_rejection());
    }

    #[tokio::test]
    async fn test_exhausted_retries_abstain() {
        let provider = ScriptedProvider::new().with(
            RoleId::Cfo,
            vec![Step::Fail("down".to_string()), Step::Fail("down".to_string())],
        );
        let synth = synthesizer(provider, EngineParams::default().with_judgment_retries(1));

        let err = synth
            .try_synthesize(&request(vec![RoleId::Cfo]), &RoleId::Cfo)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesizeVoteError::RoleUnavailable { .. }));

        let provider = ScriptedProvider::new().with(RoleId::Cfo, vec![Step::Fail("down".to_string())]);
        let synth = synthesizer(provider, EngineParams::default().with_judgment_retries(0));
        let vote = synth.synthesize(&request(vec![RoleId::Cfo]), &RoleId::Cfo).await.unwrap();
        assert!(vote.is_abstention());
        assert_eq!(vote.vote_value(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_abstains_without_retry() {
        let provider = ScriptedProvider::new().with(
            RoleId::Cfo,
            vec![Step::Delay(Duration::from_secs(60), 0.9), Step::score(0.9)],
        );
        let provider = Arc::new(provider);
        let synth = VoteSynthesizer::new(
            Arc::clone(&provider),
            Arc::new(AdapterFusionRegistry::default()),
            Arc::new(PurposeAlignmentTable::boardroom_default()),
            Arc::new(RwLock::new(TrackRecordBook::new())),
            EngineParams::default()
                .with_judgment_timeout(Duration::from_secs(5))
                .with_judgment_retries(3),
        );

        let err = synth
            .try_synthesize(&request(vec![RoleId::Cfo]), &RoleId::Cfo)
            .await
            .unwrap_err();
        match err {
            SynthesizeVoteError::RoleUnavailable { source, .. } => assert!(source.is_timeout()),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(provider.calls(&RoleId::Cfo), 1);
    }

    #[tokio::test]
    async fn test_nan_score_abstains() {
        let provider = ScriptedProvider::new().with(RoleId::Cfo, vec![Step::score(f64::NAN)]);
        let synth = synthesizer(provider, EngineParams::default().with_judgment_retries(0));
        let vote = synth.synthesize(&request(vec![RoleId::Cfo]), &RoleId::Cfo).await.unwrap();
        assert!(vote.is_abstention());
    }

    #[tokio::test]
    async fn test_adapter_from_registry_is_sent() {
        let provider = Arc::new(ScriptedProvider::new().with(RoleId::Cfo, vec![Step::score(0.7)]));
        let registry = Arc::new(AdapterFusionRegistry::new([AdapterFusionConfig::baseline(RoleId::Cfo)]));
        registry
            .deploy(
                &RoleId::Cfo,
                boardroom_domain::CapacityTier::Upgraded,
                boardroom_domain::ModelVersion::new("cfo-upgraded-v1"),
            )
            .unwrap();
        let synth = VoteSynthesizer::new(
            Arc::clone(&provider),
            registry,
            Arc::new(PurposeAlignmentTable::boardroom_default()),
            Arc::new(RwLock::new(TrackRecordBook::new())),
            EngineParams::default(),
        );
        synth.synthesize(&request(vec![RoleId::Cfo]), &RoleId::Cfo).await.unwrap();
        assert_eq!(
            provider.last_model(&RoleId::Cfo).unwrap().as_str(),
            "cfo-upgraded-v1"
        );
    }
}
