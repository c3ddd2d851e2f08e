//! Capacity upgrade configuration from TOML (`[upgrade]` section)

use boardroom_application::UpgradeParams;
use boardroom_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Raw capacity upgrade configuration from TOML
///
/// # Example
///
/// ```toml
/// [upgrade]
/// plateau_window = 3            # evaluation cycles a trigger must hold across
/// plateau_epsilon = 0.02
/// min_corpus_growth = 200
/// conflict_epsilon = 0.01
/// promotion_margin = 0.02
/// parallel_window = 20          # probes both tiers are scored on
/// distillation = true
/// distillation_examples = 25
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileUpgradeConfig {
    pub plateau_window: usize,
    pub plateau_epsilon: f64,
    pub min_corpus_growth: usize,
    pub conflict_epsilon: f64,
    pub promotion_margin: f64,
    pub parallel_window: usize,
    pub distillation: bool,
    pub distillation_examples: usize,
}

impl Default for FileUpgradeConfig {
    fn default() -> Self {
        let params = UpgradeParams::default();
        Self {
            plateau_window: params.plateau_window,
            plateau_epsilon: params.plateau_epsilon,
            min_corpus_growth: params.min_corpus_growth,
            conflict_epsilon: params.conflict_epsilon,
            promotion_margin: params.promotion_margin,
            parallel_window: params.parallel_window,
            distillation: params.distillation,
            distillation_examples: params.distillation_examples,
        }
    }
}

impl FileUpgradeConfig {
    /// Convert to [`UpgradeParams`], replacing unusable values with defaults.
    pub fn to_upgrade_params(&self) -> (UpgradeParams, Vec<ConfigIssue>) {
        let defaults = UpgradeParams::default();
        let mut issues = Vec::new();

        let plateau_window = if self.plateau_window < 2 {
            issues.push(out_of_range(
                "upgrade.plateau_window",
                self.plateau_window as f64,
                "needs at least 2 cycles",
                defaults.plateau_window as f64,
            ));
            defaults.plateau_window
        } else {
            self.plateau_window
        };
        let parallel_window = if self.parallel_window == 0 {
            issues.push(out_of_range(
                "upgrade.parallel_window",
                0.0,
                "must score at least one probe",
                defaults.parallel_window as f64,
            ));
            defaults.parallel_window
        } else {
            self.parallel_window
        };

        let plateau_epsilon = non_negative(
            "upgrade.plateau_epsilon",
            self.plateau_epsilon,
            defaults.plateau_epsilon,
            &mut issues,
        );
        let conflict_epsilon = non_negative(
            "upgrade.conflict_epsilon",
            self.conflict_epsilon,
            defaults.conflict_epsilon,
            &mut issues,
        );
        let promotion_margin = non_negative(
            "upgrade.promotion_margin",
            self.promotion_margin,
            defaults.promotion_margin,
            &mut issues,
        );

        let params = UpgradeParams {
            plateau_window,
            plateau_epsilon,
            min_corpus_growth: self.min_corpus_growth,
            conflict_epsilon,
            promotion_margin,
            parallel_window,
            distillation: self.distillation,
            distillation_examples: self.distillation_examples,
        };
        (params, issues)
    }
}

fn non_negative(field: &str, value: f64, fallback: f64, issues: &mut Vec<ConfigIssue>) -> f64 {
    if value.is_finite() && value >= 0.0 {
        return value;
    }
    issues.push(out_of_range(field, value, "must be a non-negative number", fallback));
    fallback
}

fn out_of_range(field: &str, value: f64, reason: &str, fallback: f64) -> ConfigIssue {
    ConfigIssue::warning(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
            value,
        },
        format!("{}: {}, falling back to {}", field, reason, fallback),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_config_deserialize() {
        let toml_str = r#"
[upgrade]
parallel_window = 5
distillation = false
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let (params, issues) = config.upgrade.to_upgrade_params();
        assert!(issues.is_empty());
        assert_eq!(params.parallel_window, 5);
        assert!(!params.distillation);
        assert_eq!(params.promotion_margin, 0.02);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = FileUpgradeConfig {
            plateau_window: 1,
            promotion_margin: -0.5,
            ..Default::default()
        };
        let (params, issues) = config.to_upgrade_params();
        assert_eq!(issues.len(), 2);
        assert_eq!(params.plateau_window, 3);
        assert_eq!(params.promotion_margin, 0.02);
    }
}
