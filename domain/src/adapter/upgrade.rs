//! Capacity upgrade trigger detection
//!
//! A trigger never fires on a single sample: metrics are judged across the
//! last `window` evaluation cycles, and a plateau only counts if the
//! self-learning corpus kept growing over the same cycles.

use crate::learning::evaluation::EvaluationScore;
use serde::{Deserialize, Serialize};

const PLATEAU_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTrigger {
    FidelityPlateau,
    ClarityPlateau,
    ConflictStagnation,
    OperatorRequested,
}

impl UpgradeTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeTrigger::FidelityPlateau => "role_fidelity plateau",
            UpgradeTrigger::ClarityPlateau => "leadership_clarity plateau",
            UpgradeTrigger::ConflictStagnation => "conflict_index not improving",
            UpgradeTrigger::OperatorRequested => "operator request",
        }
    }
}

impl std::fmt::Display for UpgradeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One evaluation cycle as seen by the upgrade detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSample {
    pub score: EvaluationScore,
    /// Size of the self-learning corpus when the model was trained
    pub self_learning_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateauCriteria {
    /// Number of consecutive cycles considered
    pub window: usize,
    /// Max spread of a metric across the window that still counts as flat
    pub epsilon: f64,
    /// Corpus growth across the window required before a plateau counts
    pub min_corpus_growth: usize,
    /// Conflict must drop by more than this across the window
    pub conflict_epsilon: f64,
}

impl Default for PlateauCriteria {
    fn default() -> Self {
        Self {
            window: 3,
            epsilon: 0.02,
            min_corpus_growth: 200,
            conflict_epsilon: 0.01,
        }
    }
}

/// Detect every trigger that holds over the most recent samples.
///
/// `samples` is ordered oldest first. The operator flag is appended last
/// when set, independent of the metric history.
pub fn detect_triggers(
    samples: &[EvaluationSample],
    criteria: &PlateauCriteria,
    operator_requested: bool,
) -> Vec<UpgradeTrigger> {
    let mut triggers = Vec::new();
    let window = criteria.window.max(2);

    if samples.len() >= window {
        let recent = &samples[samples.len() - window..];
        let growth = recent[window - 1]
            .self_learning_count
            .saturating_sub(recent[0].self_learning_count);

        if growth >= criteria.min_corpus_growth {
            if spread(recent, |s| s.role_fidelity) <= criteria.epsilon + PLATEAU_TOLERANCE {
                triggers.push(UpgradeTrigger::FidelityPlateau);
            }
            if spread(recent, |s| s.leadership_clarity) <= criteria.epsilon + PLATEAU_TOLERANCE {
                triggers.push(UpgradeTrigger::ClarityPlateau);
            }

            let first = recent[0].score.conflict_index;
            let best_later = recent[1..]
                .iter()
                .map(|s| s.score.conflict_index)
                .fold(f64::INFINITY, f64::min);
            if first - best_later <= criteria.conflict_epsilon + PLATEAU_TOLERANCE {
                triggers.push(UpgradeTrigger::ConflictStagnation);
            }
        }
    }

    if operator_requested {
        triggers.push(UpgradeTrigger::OperatorRequested);
    }
    triggers
}

fn spread(samples: &[EvaluationSample], metric: impl Fn(&EvaluationScore) -> f64) -> f64 {
    let (min, max) = samples
        .iter()
        .map(|s| metric(&s.score))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    max - min
}

/// Mean `overall` of a window of scores, `None` when empty
pub fn mean_overall(scores: &[EvaluationScore]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().map(|s| s.overall).sum::<f64>() / scores.len() as f64)
}
