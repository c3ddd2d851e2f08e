//! Lexicon-based judgment provider
//!
//! Scores a proposal by counting favourable and unfavourable terms from two
//! lexicons: one for the role's domain expertise and one shared leadership
//! lexicon. The two scores are blended by the adapter's domain weight, so
//! the [`AdapterFusionConfig`] directly shapes the judgment. Deterministic
//! and offline; useful for demos and as a fallback backend.

use async_trait::async_trait;
use boardroom_application::{DomainJudgmentProvider, Judgment, JudgmentError, JudgmentRequest};
use boardroom_domain::{AdapterFusionConfig, CapacityTier, RoleId};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

struct Lexicon {
    favourable: &'static [&'static str],
    unfavourable: &'static [&'static str],
}

const LEADERSHIP: Lexicon = Lexicon {
    favourable: &[
        "growth", "customer", "long-term", "focus", "core market", "pilot", "opportunity",
        "accelerate",
    ],
    unfavourable: &["risk", "uncertain", "delay", "exit", "layoff", "eighteen months"],
};

fn domain_lexicon(role: &RoleId) -> Lexicon {
    match role {
        RoleId::Ceo => Lexicon {
            favourable: &["strategy", "growth engine", "joint venture", "expansion", "reposition"],
            unfavourable: &["distraction", "reputational", "dilute"],
        },
        RoleId::Cfo => Lexicon {
            favourable: &["payback", "cut", "reserves", "margin", "cash flow", "savings", "retire the vendor license"],
            unfavourable: &["debt", "acquire", "loss", "overrun", "30m", "write-off"],
        },
        RoleId::Cto => Lexicon {
            favourable: &["platform", "cloud", "open-source", "migrate", "modernize", "automation"],
            unfavourable: &["legacy", "outage", "rewrite", "vendor lock-in"],
        },
        RoleId::Coo => Lexicon {
            favourable: &["consolidate", "cadence", "streamline", "efficiency", "managed"],
            unfavourable: &["outsource", "disruption", "bottleneck", "rewrite"],
        },
        RoleId::Cmo => Lexicon {
            favourable: &["subscription", "brand", "launch", "sales region", "partner"],
            unfavourable: &["churn", "backlash", "exit"],
        },
        RoleId::Chro => Lexicon {
            favourable: &["teams", "training", "retention", "culture", "hiring"],
            unfavourable: &["layoff", "outsource", "attrition", "burnout"],
        },
        RoleId::GeneralCounsel => Lexicon {
            favourable: &["audit", "compliance", "policy", "board approval", "retention policy"],
            unfavourable: &["acquire", "lawsuit", "liability", "violation"],
        },
        RoleId::Custom(_) => Lexicon {
            favourable: &[],
            unfavourable: &[],
        },
    }
}

/// Counts of matched terms in one lexicon
#[derive(Debug, Default)]
struct Matches {
    favourable: Vec<&'static str>,
    unfavourable: Vec<&'static str>,
}

impl Matches {
    fn find(lexicon: &Lexicon, text: &str) -> Self {
        Self {
            favourable: lexicon
                .favourable
                .iter()
                .copied()
                .filter(|t| text.contains(t))
                .collect(),
            unfavourable: lexicon
                .unfavourable
                .iter()
                .copied()
                .filter(|t| text.contains(t))
                .collect(),
        }
    }

    fn total(&self) -> usize {
        self.favourable.len() + self.unfavourable.len()
    }

    /// `0.5` when nothing matched, tending to 0 or 1 with more evidence
    fn score(&self) -> f64 {
        let pos = self.favourable.len() as f64;
        let neg = self.unfavourable.len() as f64;
        0.5 + 0.5 * (pos - neg) / (pos + neg + 1.0)
    }
}

/// Deterministic offline judgment backend
#[derive(Debug, Default)]
pub struct HeuristicJudgmentProvider {
    latency: Duration,
    unavailable: Mutex<HashSet<RoleId>>,
}

impl HeuristicJudgmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Builder Methods ====================

    /// Simulated inference latency per call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make a role's backend report itself unavailable
    pub fn set_unavailable(&self, role: RoleId, unavailable: bool) {
        let mut roles = self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if unavailable {
            roles.insert(role);
        } else {
            roles.remove(&role);
        }
    }

    /// Score a proposal synchronously
    pub fn judge(&self, adapter: &AdapterFusionConfig, proposal_text: &str) -> Judgment {
        let text = proposal_text.to_lowercase();
        let domain = Matches::find(&domain_lexicon(&adapter.role_id), &text);
        let leadership = Matches::find(&LEADERSHIP, &text);

        let score = adapter.domain_weight() * domain.score()
            + adapter.leadership_weight() * leadership.score();

        let tier_bonus = match adapter.capacity_tier {
            CapacityTier::Baseline => 0.0,
            CapacityTier::Upgraded => 0.05,
        };
        let evidence = (domain.total() + leadership.total()) as f64;
        let confidence = (0.45 + 0.1 * evidence + tier_bonus).min(0.95);

        Judgment::new(score.clamp(0.0, 1.0), rationale(&adapter.role_id, &domain, &leadership))
            .with_confidence(confidence)
    }
}

fn rationale(role: &RoleId, domain: &Matches, leadership: &Matches) -> String {
    let mut favourable: Vec<&str> = domain.favourable.clone();
    favourable.extend(leadership.favourable.iter().copied());
    let mut unfavourable: Vec<&str> = domain.unfavourable.clone();
    unfavourable.extend(leadership.unfavourable.iter().copied());

    match (favourable.is_empty(), unfavourable.is_empty()) {
        (true, true) => format!("{} sees nothing decisive in the proposal", role.title()),
        (false, true) => format!("{} supports: {}", role.title(), favourable.join(", ")),
        (true, false) => format!("{} is concerned about: {}", role.title(), unfavourable.join(", ")),
        (false, false) => format!(
            "{} weighs {} against {}",
            role.title(),
            favourable.join(", "),
            unfavourable.join(", ")
        ),
    }
}

#[async_trait]
impl DomainJudgmentProvider for HeuristicJudgmentProvider {
    async fn evaluate(&self, request: &JudgmentRequest) -> Result<Judgment, JudgmentError> {
        let unavailable = self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&request.role_id);
        if unavailable {
            return Err(JudgmentError::Unavailable(format!(
                "{} backend is offline",
                request.role_id
            )));
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let judgment = self.judge(&request.adapter, &request.proposal_text);
        debug!(
            "{} judged {} proposal at {:.2} ({})",
            request.role_id, request.decision_type, judgment.score, request.adapter.active_model_version
        );
        Ok(judgment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardroom_domain::DecisionType;

    fn request(role: RoleId, text: &str) -> JudgmentRequest {
        JudgmentRequest {
            adapter: AdapterFusionConfig::baseline(role.clone()),
            role_id: role,
            proposal_text: text.to_string(),
            decision_type: DecisionType::Investment,
        }
    }

    #[test]
    fn test_neutral_text_scores_half() {
        let provider = HeuristicJudgmentProvider::new();
        let judgment = provider.judge(&AdapterFusionConfig::baseline(RoleId::Cfo), "Paint the lobby");
        assert!((judgment.score - 0.5).abs() < 1e-9);
        assert_eq!(judgment.confidence, Some(0.45));
        assert!(judgment.rationale.contains("nothing decisive"));
    }

    #[test]
    fn test_roles_disagree_on_the_same_proposal() {
        let provider = HeuristicJudgmentProvider::new();
        let text = "Raise 30M in debt to rewrite the legacy platform";
        let cfo = provider.judge(&AdapterFusionConfig::baseline(RoleId::Cfo), text);
        let cto = provider.judge(&AdapterFusionConfig::baseline(RoleId::Cto), text);
        assert!(cfo.score < 0.5);
        assert!(cfo.rationale.contains("debt"));
        assert!(cto.confidence.unwrap() > 0.45);
    }

    #[test]
    fn test_domain_weight_shifts_the_blend() {
        let provider = HeuristicJudgmentProvider::new();
        // Domain lexicon favourable, leadership lexicon unfavourable
        let text = "Cut costs despite the risk";
        let domain_heavy = AdapterFusionConfig::new(RoleId::Cfo, 0.9).unwrap();
        let leadership_heavy = AdapterFusionConfig::new(RoleId::Cfo, 0.1).unwrap();
        assert!(provider.judge(&domain_heavy, text).score > provider.judge(&leadership_heavy, text).score);
    }

    #[tokio::test]
    async fn test_unavailable_role() {
        let provider = HeuristicJudgmentProvider::new();
        provider.set_unavailable(RoleId::Coo, true);
        let err = provider.evaluate(&request(RoleId::Coo, "anything")).await.unwrap_err();
        assert!(matches!(err, JudgmentError::Unavailable(_)));

        provider.set_unavailable(RoleId::Coo, false);
        assert!(provider.evaluate(&request(RoleId::Coo, "anything")).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let provider = HeuristicJudgmentProvider::new().with_latency(Duration::from_secs(3));
        let started = tokio::time::Instant::now();
        provider.evaluate(&request(RoleId::Cfo, "margin")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
