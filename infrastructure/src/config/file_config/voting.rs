//! Voting configuration from TOML (`[voting]` section)

use boardroom_application::EngineParams;
use boardroom_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw voting configuration from TOML
///
/// # Example
///
/// ```toml
/// [voting]
/// judgment_timeout_ms = 10000   # one role's judgment, retries included
/// collection_window_ms = 30000  # the whole vote collection barrier
/// judgment_retries = 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVotingConfig {
    pub judgment_timeout_ms: u64,
    pub collection_window_ms: u64,
    pub judgment_retries: usize,
}

impl Default for FileVotingConfig {
    fn default() -> Self {
        let params = EngineParams::default();
        Self {
            judgment_timeout_ms: params.judgment_timeout.as_millis() as u64,
            collection_window_ms: params.collection_window.as_millis() as u64,
            judgment_retries: params.judgment_retries,
        }
    }
}

impl FileVotingConfig {
    /// Convert to [`EngineParams`]; zero durations fall back to the default.
    pub fn to_engine_params(&self) -> (EngineParams, Vec<ConfigIssue>) {
        let defaults = EngineParams::default();
        let mut issues = Vec::new();

        let judgment_timeout = positive_millis(
            "voting.judgment_timeout_ms",
            self.judgment_timeout_ms,
            defaults.judgment_timeout,
            &mut issues,
        );
        let collection_window = positive_millis(
            "voting.collection_window_ms",
            self.collection_window_ms,
            defaults.collection_window,
            &mut issues,
        );

        let params = EngineParams::default()
            .with_judgment_timeout(judgment_timeout)
            .with_collection_window(collection_window)
            .with_judgment_retries(self.judgment_retries);
        (params, issues)
    }
}

pub(super) fn positive_millis(
    field: &str,
    value: u64,
    fallback: Duration,
    issues: &mut Vec<ConfigIssue>,
) -> Duration {
    if value == 0 {
        issues.push(ConfigIssue::warning(
            ConfigIssueCode::ZeroDuration {
                field: field.to_string(),
            },
            format!("{}: must be positive, falling back to {:?}", field, fallback),
        ));
        return fallback;
    }
    Duration::from_millis(value)
}

pub(super) fn positive_secs(
    field: &str,
    value: u64,
    fallback: Duration,
    issues: &mut Vec<ConfigIssue>,
) -> Duration {
    positive_millis(field, value.saturating_mul(1000), fallback, issues)
}
