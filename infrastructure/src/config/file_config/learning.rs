//! Self-learning configuration from TOML (`[learning]` section)

use super::voting::{positive_millis, positive_secs};
use boardroom_application::LearningParams;
use boardroom_domain::{BlendRatio, ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Raw self-learning configuration from TOML
///
/// # Example
///
/// ```toml
/// [learning]
/// target_blend_ratio = 0.7          # original share, within [0.6, 0.8]
/// min_new_examples = 50
/// curate_interval_secs = 86400
/// training_poll_interval_ms = 1000
/// training_timeout_secs = 3600
/// regression_tolerance = 0.0
/// background_interval_secs = 60
/// generated_situations = 0          # per role and tick
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLearningConfig {
    pub target_blend_ratio: f64,
    pub min_new_examples: usize,
    pub curate_interval_secs: u64,
    pub training_poll_interval_ms: u64,
    pub training_timeout_secs: u64,
    pub regression_tolerance: f64,
    pub background_interval_secs: u64,
    pub generated_situations: usize,
    pub situation_timeout_ms: u64,
}

impl Default for FileLearningConfig {
    fn default() -> Self {
        let params = LearningParams::default();
        Self {
            target_blend_ratio: params.target_blend_ratio.original_share(),
            min_new_examples: params.min_new_examples,
            curate_interval_secs: params.curate_interval.as_secs(),
            training_poll_interval_ms: params.training_poll_interval.as_millis() as u64,
            training_timeout_secs: params.training_timeout.as_secs(),
            regression_tolerance: params.regression_tolerance,
            background_interval_secs: params.background_interval.as_secs(),
            generated_situations: params.generated_situations,
            situation_timeout_ms: params.situation_timeout.as_millis() as u64,
        }
    }
}

impl FileLearningConfig {
    /// Convert to [`LearningParams`].
    ///
    /// A blend ratio outside `[0.6, 0.8]` is clamped with a warning; zero
    /// durations fall back to the defaults.
    pub fn to_learning_params(&self) -> (LearningParams, Vec<ConfigIssue>) {
        let defaults = LearningParams::default();
        let mut issues = Vec::new();

        if BlendRatio::new(self.target_blend_ratio).is_err() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "learning.target_blend_ratio".to_string(),
                    value: self.target_blend_ratio,
                },
                format!(
                    "learning.target_blend_ratio: {} is outside [0.6, 0.8], clamping to {}",
                    self.target_blend_ratio,
                    BlendRatio::clamped(self.target_blend_ratio).original_share()
                ),
            ));
        }
        if self.regression_tolerance < 0.0 || self.regression_tolerance.is_nan() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "learning.regression_tolerance".to_string(),
                    value: self.regression_tolerance,
                },
                "learning.regression_tolerance: must not be negative, using 0.0",
            ));
        }

        let curate_interval = positive_secs(
            "learning.curate_interval_secs",
            self.curate_interval_secs,
            defaults.curate_interval,
            &mut issues,
        );
        let poll_interval = positive_millis(
            "learning.training_poll_interval_ms",
            self.training_poll_interval_ms,
            defaults.training_poll_interval,
            &mut issues,
        );
        let training_timeout = positive_secs(
            "learning.training_timeout_secs",
            self.training_timeout_secs,
            defaults.training_timeout,
            &mut issues,
        );
        let background_interval = positive_secs(
            "learning.background_interval_secs",
            self.background_interval_secs,
            defaults.background_interval,
            &mut issues,
        );
        let situation_timeout = positive_millis(
            "learning.situation_timeout_ms",
            self.situation_timeout_ms,
            defaults.situation_timeout,
            &mut issues,
        );

        let tolerance = if self.regression_tolerance.is_finite() {
            self.regression_tolerance
        } else {
            0.0
        };
        let mut params = defaults
            .with_target_blend_ratio(self.target_blend_ratio)
            .with_min_new_examples(self.min_new_examples)
            .with_curate_interval(curate_interval)
            .with_training_poll_interval(poll_interval)
            .with_training_timeout(training_timeout)
            .with_regression_tolerance(tolerance)
            .with_background_interval(background_interval)
            .with_generated_situations(self.generated_situations);
        params.situation_timeout = situation_timeout;
        (params, issues)
    }
}
