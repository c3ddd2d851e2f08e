//! Board composition from TOML (`[[roles]]`, `[weights.*]`, `[alignment.*]`)
//!
//! Roles replace the default board when any are listed. Weight and alignment
//! entries override the built-in tables one cell at a time.

use boardroom_domain::{
    AdapterFusionConfig, CapacityTier, ConfigIssue, ConfigIssueCode, DecisionType, ModelVersion,
    PurposeAlignmentTable, RoleId, RoleWeightProfile,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// `decision_type -> role -> multiplier`
pub type FileWeightsConfig = BTreeMap<String, BTreeMap<String, f64>>;

/// `role -> decision_type -> score`
pub type FileAlignmentConfig = BTreeMap<String, BTreeMap<String, f64>>;

/// One seat of the board
///
/// # Example
///
/// ```toml
/// [[roles]]
/// id = "cfo"
/// domain_weight = 0.65
/// seed_corpus = "corpora/cfo.jsonl"
///
/// [[roles]]
/// id = "cto"
/// tier = "upgraded"
/// model_version = "cto-upgraded-v3"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRoleConfig {
    pub id: String,
    #[serde(default = "default_domain_weight")]
    pub domain_weight: f64,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
    /// JSONL file of original examples for the role
    #[serde(default)]
    pub seed_corpus: Option<PathBuf>,
}

fn default_domain_weight() -> f64 {
    boardroom_domain::adapter::fusion::DEFAULT_DOMAIN_WEIGHT
}

impl FileRoleConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain_weight: default_domain_weight(),
            tier: None,
            model_version: None,
            seed_corpus: None,
        }
    }
}

/// Build the fusion configs for the board.
///
/// An empty list yields the default board. Unparseable or duplicated role
/// ids are errors; a bad weight or tier falls back with a warning.
pub fn parse_roles(roles: &[FileRoleConfig]) -> (Vec<AdapterFusionConfig>, Vec<ConfigIssue>) {
    if roles.is_empty() {
        let board = RoleId::default_board()
            .into_iter()
            .map(AdapterFusionConfig::baseline)
            .collect();
        return (board, vec![]);
    }

    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut configs = Vec::with_capacity(roles.len());

    for entry in roles {
        let role: RoleId = match entry.id.parse() {
            Ok(role) => role,
            Err(_) => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "roles.id".to_string(),
                        value: entry.id.clone(),
                        valid_values: RoleId::default_board()
                            .iter()
                            .map(|r| r.as_str().to_string())
                            .collect(),
                    },
                    format!("roles.id: '{}' is not a usable role identifier", entry.id),
                ));
                continue;
            }
        };
        if !seen.insert(role.clone()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::DuplicateRole {
                    role: role.to_string(),
                },
                format!("roles: '{}' is declared more than once", role),
            ));
            continue;
        }

        let mut config = match AdapterFusionConfig::new(role.clone(), entry.domain_weight) {
            Ok(config) => config,
            Err(_) => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange {
                        field: format!("roles.{}.domain_weight", role),
                        value: entry.domain_weight,
                    },
                    format!(
                        "roles.{}.domain_weight: {} must lie strictly between 0 and 1, using {}",
                        role,
                        entry.domain_weight,
                        default_domain_weight()
                    ),
                ));
                AdapterFusionConfig::baseline(role.clone())
            }
        };

        let tier = match entry.tier.as_deref().map(str::parse::<CapacityTier>) {
            None => CapacityTier::Baseline,
            Some(Ok(tier)) => tier,
            Some(Err(_)) => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: format!("roles.{}.tier", role),
                        value: entry.tier.clone().unwrap_or_default(),
                        valid_values: vec!["baseline".to_string(), "upgraded".to_string()],
                    },
                    format!(
                        "roles.{}.tier: unknown value '{}', falling back to 'baseline'",
                        role,
                        entry.tier.as_deref().unwrap_or_default()
                    ),
                ));
                CapacityTier::Baseline
            }
        };
        let version = entry
            .model_version
            .as_deref()
            .map(ModelVersion::new)
            .unwrap_or_else(|| ModelVersion::initial(&role, tier));
        if tier != config.capacity_tier || version != config.active_model_version {
            config = config.deployed(tier, version);
        }
        configs.push(config);
    }

    (configs, issues)
}

/// Apply weight overrides on top of the default profile
pub fn parse_weights(weights: &FileWeightsConfig) -> (RoleWeightProfile, Vec<ConfigIssue>) {
    let mut profile = RoleWeightProfile::boardroom_default();
    let mut issues = Vec::new();

    for (type_name, roles) in weights {
        let Some(decision_type) = parse_decision_type("weights", type_name, &mut issues) else {
            continue;
        };
        for (role_name, weight) in roles {
            let Some(role) = parse_role("weights", type_name, role_name, &mut issues) else {
                continue;
            };
            if profile.set_weight(decision_type, role, *weight).is_err() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange {
                        field: format!("weights.{}.{}", type_name, role_name),
                        value: *weight,
                    },
                    format!(
                        "weights.{}.{}: {} must be a non-negative number, keeping the default",
                        type_name, role_name, weight
                    ),
                ));
            }
        }
    }

    (profile, issues)
}

/// Apply alignment overrides on top of the default table
pub fn parse_alignment(alignment: &FileAlignmentConfig) -> (PurposeAlignmentTable, Vec<ConfigIssue>) {
    let mut table = PurposeAlignmentTable::boardroom_default();
    let mut issues = Vec::new();

    for (role_name, types) in alignment {
        let Ok(role) = role_name.parse::<RoleId>() else {
            issues.push(invalid_role("alignment", role_name));
            continue;
        };
        for (type_name, score) in types {
            let Some(decision_type) =
                parse_decision_type(&format!("alignment.{}", role_name), type_name, &mut issues)
            else {
                continue;
            };
            if table.set_score(role.clone(), decision_type, *score).is_err() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange {
                        field: format!("alignment.{}.{}", role_name, type_name),
                        value: *score,
                    },
                    format!(
                        "alignment.{}.{}: {} is outside [0, 1], keeping the default",
                        role_name, type_name, score
                    ),
                ));
            }
        }
    }

    (table, issues)
}

fn parse_decision_type(
    section: &str,
    name: &str,
    issues: &mut Vec<ConfigIssue>,
) -> Option<DecisionType> {
    match name.parse::<DecisionType>() {
        Ok(decision_type) => Some(decision_type),
        Err(_) => {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidEnumValue {
                    field: section.to_string(),
                    value: name.to_string(),
                    valid_values: DecisionType::ALL
                        .iter()
                        .map(|t| t.as_str().to_string())
                        .collect(),
                },
                format!("{}: unknown decision type '{}', ignoring it", section, name),
            ));
            None
        }
    }
}

fn parse_role(
    section: &str,
    type_name: &str,
    name: &str,
    issues: &mut Vec<ConfigIssue>,
) -> Option<RoleId> {
    match name.parse::<RoleId>() {
        Ok(role) => Some(role),
        Err(_) => {
            issues.push(invalid_role(&format!("{}.{}", section, type_name), name));
            None
        }
    }
}

fn invalid_role(field: &str, name: &str) -> ConfigIssue {
    ConfigIssue::warning(
        ConfigIssueCode::InvalidEnumValue {
            field: field.to_string(),
            value: name.to_string(),
            valid_values: RoleId::default_board()
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
        },
        format!("{}: '{}' is not a usable role identifier, ignoring it", field, name),
    )
}
