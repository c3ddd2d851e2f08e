//! Self-learning loop parameters.

use boardroom_domain::BlendRatio;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cadence and thresholds for curation, retraining and evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningParams {
    /// Original share of every retraining set
    pub target_blend_ratio: BlendRatio,
    /// New self-learning entries that trigger curation on their own
    pub min_new_examples: usize,
    /// Elapsed time that triggers curation when anything new exists
    pub curate_interval: Duration,
    pub training_poll_interval: Duration,
    pub training_timeout: Duration,
    /// How far below the deployed score a candidate may fall and still deploy
    pub regression_tolerance: f64,
    /// Tick of the background loop
    pub background_interval: Duration,
    /// Situations generated per role when the loop collects on its own
    pub generated_situations: usize,
    /// Bound for answering one generated situation
    pub situation_timeout: Duration,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            target_blend_ratio: BlendRatio::default(),
            min_new_examples: 50,
            curate_interval: Duration::from_secs(24 * 60 * 60),
            training_poll_interval: Duration::from_secs(1),
            training_timeout: Duration::from_secs(60 * 60),
            regression_tolerance: 0.0,
            background_interval: Duration::from_secs(60),
            generated_situations: 0,
            situation_timeout: Duration::from_secs(10),
        }
    }
}

impl LearningParams {
    // ==================== Builder Methods ====================

    /// Targets outside `[0.6, 0.8]` are clamped into range
    pub fn with_target_blend_ratio(mut self, ratio: f64) -> Self {
        self.target_blend_ratio = BlendRatio::clamped(ratio);
        self
    }

    pub fn with_min_new_examples(mut self, count: usize) -> Self {
        self.min_new_examples = count;
        self
    }

    pub fn with_curate_interval(mut self, interval: Duration) -> Self {
        self.curate_interval = interval;
        self
    }

    pub fn with_training_poll_interval(mut self, interval: Duration) -> Self {
        self.training_poll_interval = interval;
        self
    }

    pub fn with_training_timeout(mut self, timeout: Duration) -> Self {
        self.training_timeout = timeout;
        self
    }

    pub fn with_regression_tolerance(mut self, tolerance: f64) -> Self {
        self.regression_tolerance = tolerance.max(0.0);
        self
    }

    pub fn with_background_interval(mut self, interval: Duration) -> Self {
        self.background_interval = interval;
        self
    }

    pub fn with_generated_situations(mut self, count: usize) -> Self {
        self.generated_situations = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = LearningParams::default();
        assert_eq!(params.target_blend_ratio.original_share(), 0.7);
        assert_eq!(params.min_new_examples, 50);
        assert_eq!(params.curate_interval, Duration::from_secs(86_400));
        assert_eq!(params.regression_tolerance, 0.0);
    }

    #[test]
    fn test_blend_ratio_is_clamped() {
        let params = LearningParams::default().with_target_blend_ratio(0.95);
        assert_eq!(params.target_blend_ratio.original_share(), 0.8);
    }

    #[test]
    fn test_negative_tolerance_is_zeroed() {
        let params = LearningParams::default().with_regression_tolerance(-1.0);
        assert_eq!(params.regression_tolerance, 0.0);
    }
}
