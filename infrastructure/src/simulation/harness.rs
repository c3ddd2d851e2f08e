//! Simulated evaluation harness
//!
//! Scores follow saturating curves over the training set size, capped by a
//! per-tier ceiling. Each probe adds a small deterministic jitter derived
//! from the model fingerprint, so repeated evaluations agree.

use super::catalog::{ModelCatalog, ModelProfile};
use async_trait::async_trait;
use boardroom_application::{EvaluationError, EvaluationHarness, EvaluationRequest};
use boardroom_domain::{CapacityTier, EvaluationScore};
use tracing::debug;

/// Examples at which a model has covered ~63% of its headroom
const LEARNING_SCALE: f64 = 150.0;
const PROBE_JITTER: f64 = 0.01;

pub struct SimulatedEvaluationHarness {
    catalog: ModelCatalog,
}

impl SimulatedEvaluationHarness {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self { catalog }
    }

    pub fn score(&self, request: &EvaluationRequest) -> EvaluationScore {
        let profile = self
            .catalog
            .get(&request.model_version)
            .unwrap_or_else(|| {
                ModelProfile::untrained(request.role_id.clone(), request.capacity_tier)
            });

        let ceiling = tier_ceiling(profile.capacity_tier);
        let learned = 1.0 - (-(profile.examples as f64) / LEARNING_SCALE).exp();
        let jitter = probe_jitter(&profile.fingerprint, &request.probes);

        let role_fidelity = 0.5
            + (ceiling - 0.5) * learned
            + 0.05 * profile.positive_share * profile.labeled_share
            + jitter;
        let leadership_clarity = 0.5 + (ceiling - 0.55) * learned + jitter;
        let conflict_index = 0.4 - 0.25 * learned * conflict_reach(profile.capacity_tier);
        let guardrail_compliance = 0.85 + 0.1 * profile.original_share;

        debug!(
            "Scored {} ({} examples, tier {})",
            request.model_version, profile.examples, profile.capacity_tier
        );
        EvaluationScore::new(
            request.role_id.clone(),
            request.model_version.clone(),
            role_fidelity,
            leadership_clarity,
            conflict_index,
            guardrail_compliance,
        )
    }
}

fn tier_ceiling(tier: CapacityTier) -> f64 {
    match tier {
        CapacityTier::Baseline => 0.80,
        CapacityTier::Upgraded => 0.92,
    }
}

fn conflict_reach(tier: CapacityTier) -> f64 {
    match tier {
        CapacityTier::Baseline => 0.8,
        CapacityTier::Upgraded => 1.0,
    }
}

/// Mean per-probe offset in `[-PROBE_JITTER / 2, PROBE_JITTER / 2]`
fn probe_jitter(fingerprint: &[u8; 32], probes: &[String]) -> f64 {
    if probes.is_empty() {
        return 0.0;
    }
    let total: f64 = probes
        .iter()
        .map(|probe| {
            let mut hasher = blake3::Hasher::new();
            hasher.update(fingerprint);
            hasher.update(probe.as_bytes());
            let byte = hasher.finalize().as_bytes()[0];
            (byte as f64 / 255.0 - 0.5) * PROBE_JITTER
        })
        .sum();
    total / probes.len() as f64
}

#[async_trait]
impl EvaluationHarness for SimulatedEvaluationHarness {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationScore, EvaluationError> {
        if let Some(profile) = self.catalog.get(&request.model_version)
            && profile.role_id != request.role_id
        {
            return Err(EvaluationError::UnknownModel(format!(
                "{} was trained for {}",
                request.model_version, profile.role_id
            )));
        }
        Ok(self.score(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardroom_domain::{
        ExampleId, ExampleSource, FeedbackLabel, ModelVersion, Provenance, RoleId,
        TrainingExample,
    };

    fn trained(catalog: &ModelCatalog, version: &str, tier: CapacityTier, n: usize) -> ModelVersion {
        let examples: Vec<TrainingExample> = (0..n)
            .map(|i| TrainingExample {
                id: ExampleId::new(format!("cfo-{}", i)),
                source: if i % 10 < 7 {
                    ExampleSource::Original
                } else {
                    ExampleSource::SelfLearning
                },
                role_id: RoleId::Cfo,
                situation_text: format!("situation {}", i),
                response_text: "response".to_string(),
                feedback_label: FeedbackLabel::Unlabeled,
                provenance: Provenance::now(),
                supersedes: None,
            })
            .collect();
        let version = ModelVersion::new(version);
        catalog.insert(
            version.clone(),
            ModelProfile::from_examples(RoleId::Cfo, tier, &examples),
        );
        version
    }

    fn request(version: &ModelVersion, tier: CapacityTier) -> EvaluationRequest {
        EvaluationRequest {
            role_id: RoleId::Cfo,
            model_version: version.clone(),
            capacity_tier: tier,
            probes: vec!["probe a".to_string(), "probe b".to_string()],
        }
    }

    #[tokio::test]
    async fn test_more_data_scores_higher() {
        let catalog = ModelCatalog::new();
        let small = trained(&catalog, "cfo-baseline-v1", CapacityTier::Baseline, 10);
        let large = trained(&catalog, "cfo-baseline-v2", CapacityTier::Baseline, 300);
        let harness = SimulatedEvaluationHarness::new(catalog);

        let small = harness.evaluate(&request(&small, CapacityTier::Baseline)).await.unwrap();
        let large = harness.evaluate(&request(&large, CapacityTier::Baseline)).await.unwrap();
        assert!(large.overall > small.overall + 0.02);
        assert!(large.conflict_index < small.conflict_index);
    }

    #[tokio::test]
    async fn test_upgraded_tier_has_more_headroom() {
        let catalog = ModelCatalog::new();
        let baseline = trained(&catalog, "cfo-baseline-v3", CapacityTier::Baseline, 400);
        let upgraded = trained(&catalog, "cfo-upgraded-v1", CapacityTier::Upgraded, 400);
        let harness = SimulatedEvaluationHarness::new(catalog);

        let baseline = harness.evaluate(&request(&baseline, CapacityTier::Baseline)).await.unwrap();
        let upgraded = harness.evaluate(&request(&upgraded, CapacityTier::Upgraded)).await.unwrap();
        assert!(upgraded.overall > baseline.overall + 0.02);
    }

    #[tokio::test]
    async fn test_large_sets_plateau() {
        let catalog = ModelCatalog::new();
        let a = trained(&catalog, "cfo-baseline-v1", CapacityTier::Baseline, 1500);
        let b = trained(&catalog, "cfo-baseline-v2", CapacityTier::Baseline, 1700);
        let harness = SimulatedEvaluationHarness::new(catalog);

        let a = harness.evaluate(&request(&a, CapacityTier::Baseline)).await.unwrap();
        let b = harness.evaluate(&request(&b, CapacityTier::Baseline)).await.unwrap();
        assert!((a.overall - b.overall).abs() < 0.02);
    }

    #[tokio::test]
    async fn test_scores_are_deterministic() {
        let catalog = ModelCatalog::new();
        let version = trained(&catalog, "cfo-baseline-v1", CapacityTier::Baseline, 50);
        let harness = SimulatedEvaluationHarness::new(catalog);

        let first = harness.score(&request(&version, CapacityTier::Baseline));
        let second = harness.score(&request(&version, CapacityTier::Baseline));
        assert_eq!(first.overall, second.overall);
    }

    #[tokio::test]
    async fn test_unknown_model_scores_as_untrained() {
        let harness = SimulatedEvaluationHarness::new(ModelCatalog::new());
        let initial = ModelVersion::initial(&RoleId::Cfo, CapacityTier::Baseline);
        let score = harness.evaluate(&request(&initial, CapacityTier::Baseline)).await.unwrap();
        assert!((score.role_fidelity - 0.5).abs() < 0.01);
        assert!((score.guardrail_compliance - 0.95).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rejects_model_of_another_role() {
        let catalog = ModelCatalog::new();
        let version = trained(&catalog, "cfo-baseline-v1", CapacityTier::Baseline, 5);
        let harness = SimulatedEvaluationHarness::new(catalog);

        let mut req = request(&version, CapacityTier::Baseline);
        req.role_id = RoleId::Cto;
        assert!(matches!(
            harness.evaluate(&req).await.unwrap_err(),
            EvaluationError::UnknownModel(_)
        ));
    }
}
