//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application parameters
//! together with every issue found on the way.

mod board;
mod learning;
mod logging;
mod output;
mod upgrade;
mod voting;

pub use board::{
    FileAlignmentConfig, FileRoleConfig, FileWeightsConfig, parse_alignment, parse_roles,
    parse_weights,
};
pub use learning::FileLearningConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use upgrade::FileUpgradeConfig;
pub use voting::FileVotingConfig;

use boardroom_application::BoardConfig;
use boardroom_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Decision timing
    pub voting: FileVotingConfig,
    /// Self-learning cadence
    pub learning: FileLearningConfig,
    /// Capacity upgrade detection and promotion
    pub upgrade: FileUpgradeConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
    /// Board seats; empty means the default board
    pub roles: Vec<FileRoleConfig>,
    /// Role weight overrides per decision type
    pub weights: FileWeightsConfig,
    /// Purpose alignment overrides per role
    pub alignment: FileAlignmentConfig,
}

impl FileConfig {
    /// Convert into a [`BoardConfig`], collecting every issue on the way.
    ///
    /// Values that cannot be used are replaced with their defaults, so the
    /// returned config is always usable; callers decide whether issues with
    /// [`Severity::Error`](boardroom_domain::Severity::Error) abort startup.
    pub fn to_board_config(&self) -> (BoardConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let (engine, voting_issues) = self.voting.to_engine_params();
        issues.extend(voting_issues);
        let (learning, learning_issues) = self.learning.to_learning_params();
        issues.extend(learning_issues);
        let (upgrade, upgrade_issues) = self.upgrade.to_upgrade_params();
        issues.extend(upgrade_issues);
        let (roles, role_issues) = parse_roles(&self.roles);
        issues.extend(role_issues);
        let (weights, weight_issues) = parse_weights(&self.weights);
        issues.extend(weight_issues);
        let (alignment, alignment_issues) = parse_alignment(&self.alignment);
        issues.extend(alignment_issues);

        let config = BoardConfig {
            engine,
            learning,
            upgrade,
            weights,
            alignment,
            roles,
        };
        (config, issues)
    }

    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.to_board_config().1;
        issues.extend(self.logging.parse_level().1);
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardroom_domain::{ConfigIssueCode, DecisionType, OutputFormat, RoleId};
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[voting]
judgment_timeout_ms = 4000
collection_window_ms = 12000

[learning]
min_new_examples = 20

[upgrade]
promotion_margin = 0.05

[logging]
level = "info"

[output]
format = "full"

[[roles]]
id = "ceo"

[[roles]]
id = "cfo"
domain_weight = 0.7

[weights.financial]
cfo = 1.8

[alignment.ceo]
financial = 0.6
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());

        let (board, _) = config.to_board_config();
        assert_eq!(board.engine.judgment_timeout, Duration::from_secs(4));
        assert_eq!(board.engine.collection_window, Duration::from_secs(12));
        assert_eq!(board.learning.min_new_examples, 20);
        assert_eq!(board.upgrade.promotion_margin, 0.05);
        assert_eq!(board.role_ids(), vec![RoleId::Ceo, RoleId::Cfo]);
        assert_eq!(board.weights.weight_for(DecisionType::Financial, &RoleId::Cfo), 1.8);
        assert_eq!(
            board.alignment.score_for(&RoleId::Ceo, DecisionType::Financial),
            0.6
        );
        assert_eq!(config.output.format, Some(OutputFormat::Full));
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.roles.is_empty());
        assert!(config.output.color);
        assert!(config.logging.event_log.is_none());

        let (board, issues) = config.to_board_config();
        assert!(issues.is_empty());
        assert_eq!(board.roles.len(), 7);
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let toml_str = r#"
[voting]
judgment_timeout_ms = 0

[learning]
target_blend_ratio = 0.95

[[roles]]
id = "cfo"

[[roles]]
id = "cfo"

[alignment.cfo]
financial = 2.0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 4);
        assert_eq!(issues.iter().filter(|i| i.is_error()).count(), 1);
        assert!(
            issues
                .iter()
                .any(|i| matches!(i.code, ConfigIssueCode::ZeroDuration { .. }))
        );
    }
}
