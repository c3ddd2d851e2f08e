//! Role value object representing a boardroom seat

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A boardroom role that casts votes (Value Object)
///
/// Each role is backed by its own domain judgment adapter and carries
/// its own mandate (see [`PurposeAlignmentTable`](crate::decision::weighting::PurposeAlignmentTable)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleId {
    Ceo,
    Cfo,
    Cto,
    Coo,
    Cmo,
    Chro,
    GeneralCounsel,
    /// Any seat outside the default catalogue
    Custom(String),
}

impl RoleId {
    /// Get the string identifier for this role
    pub fn as_str(&self) -> &str {
        match self {
            RoleId::Ceo => "ceo",
            RoleId::Cfo => "cfo",
            RoleId::Cto => "cto",
            RoleId::Coo => "coo",
            RoleId::Cmo => "cmo",
            RoleId::Chro => "chro",
            RoleId::GeneralCounsel => "general_counsel",
            RoleId::Custom(s) => s,
        }
    }

    /// The default boardroom seats
    pub fn default_board() -> Vec<RoleId> {
        vec![
            RoleId::Ceo,
            RoleId::Cfo,
            RoleId::Cto,
            RoleId::Coo,
            RoleId::Cmo,
            RoleId::Chro,
            RoleId::GeneralCounsel,
        ]
    }

    /// Human-readable title for display
    pub fn title(&self) -> &str {
        match self {
            RoleId::Ceo => "Chief Executive Officer",
            RoleId::Cfo => "Chief Financial Officer",
            RoleId::Cto => "Chief Technology Officer",
            RoleId::Coo => "Chief Operating Officer",
            RoleId::Cmo => "Chief Marketing Officer",
            RoleId::Chro => "Chief Human Resources Officer",
            RoleId::GeneralCounsel => "General Counsel",
            RoleId::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RoleId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::InvalidRole(s.to_string()));
        }
        Ok(match normalized.as_str() {
            "ceo" => RoleId::Ceo,
            "cfo" => RoleId::Cfo,
            "cto" => RoleId::Cto,
            "coo" => RoleId::Coo,
            "cmo" => RoleId::Cmo,
            "chro" => RoleId::Chro,
            "general_counsel" | "general-counsel" | "gc" | "clo" => RoleId::GeneralCounsel,
            _ => RoleId::Custom(normalized),
        })
    }
}

impl Serialize for RoleId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
