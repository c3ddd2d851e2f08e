//! Decision type classification

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// The category a proposal falls under
///
/// Drives both role weighting and purpose alignment lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionType {
    Investment,
    Strategic,
    Financial,
    Technical,
    Operational,
    Governance,
}

impl DecisionType {
    pub const ALL: [DecisionType; 6] = [
        DecisionType::Investment,
        DecisionType::Strategic,
        DecisionType::Financial,
        DecisionType::Technical,
        DecisionType::Operational,
        DecisionType::Governance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Investment => "investment",
            DecisionType::Strategic => "strategic",
            DecisionType::Financial => "financial",
            DecisionType::Technical => "technical",
            DecisionType::Operational => "operational",
            DecisionType::Governance => "governance",
        }
    }
}

impl std::fmt::Display for DecisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DecisionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "investment" => Ok(DecisionType::Investment),
            "strategic" | "strategy" => Ok(DecisionType::Strategic),
            "financial" | "finance" => Ok(DecisionType::Financial),
            "technical" | "technology" => Ok(DecisionType::Technical),
            "operational" | "operations" => Ok(DecisionType::Operational),
            "governance" => Ok(DecisionType::Governance),
            _ => Err(DomainError::UnknownDecisionType(s.to_string())),
        }
    }
}
