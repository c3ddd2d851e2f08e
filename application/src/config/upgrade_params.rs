//! Capacity upgrade parameters.

use boardroom_domain::PlateauCriteria;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeParams {
    /// Consecutive evaluation cycles a trigger must hold across
    pub plateau_window: usize,
    pub plateau_epsilon: f64,
    pub min_corpus_growth: usize,
    pub conflict_epsilon: f64,
    /// Mean `overall` lead the new tier needs over the current one
    pub promotion_margin: f64,
    /// Decisions both tiers are evaluated on before promotion is judged
    pub parallel_window: usize,
    /// Add current-tier outputs to the upgrade training set
    pub distillation: bool,
    pub distillation_examples: usize,
}

impl Default for UpgradeParams {
    fn default() -> Self {
        Self {
            plateau_window: 3,
            plateau_epsilon: 0.02,
            min_corpus_growth: 200,
            conflict_epsilon: 0.01,
            promotion_margin: 0.02,
            parallel_window: 20,
            distillation: true,
            distillation_examples: 25,
        }
    }
}

impl UpgradeParams {
    pub fn criteria(&self) -> PlateauCriteria {
        PlateauCriteria {
            window: self.plateau_window,
            epsilon: self.plateau_epsilon,
            min_corpus_growth: self.min_corpus_growth,
            conflict_epsilon: self.conflict_epsilon,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_plateau_window(mut self, window: usize) -> Self {
        self.plateau_window = window;
        self
    }

    pub fn with_promotion_margin(mut self, margin: f64) -> Self {
        self.promotion_margin = margin;
        self
    }

    pub fn with_parallel_window(mut self, window: usize) -> Self {
        self.parallel_window = window;
        self
    }

    pub fn with_distillation(mut self, enabled: bool, examples: usize) -> Self {
        self.distillation = enabled;
        self.distillation_examples = examples;
        self
    }
}
