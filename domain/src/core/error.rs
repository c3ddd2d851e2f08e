//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Role '{0}' is not participating in this decision")]
    UnknownRole(String),

    #[error("No votes were collected for decision {0}")]
    NoVotes(String),

    #[error("Dataset integrity violation on original example {example_id}: {reason}")]
    DatasetIntegrity { example_id: String, reason: String },

    #[error("Blend ratio {0} is outside the permitted range [0.6, 0.8]")]
    InvalidBlendRatio(f64),

    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Domain weight {0} must lie strictly between 0 and 1")]
    InvalidFusionWeight(f64),

    #[error("{field} = {value} is out of range")]
    OutOfRange { field: String, value: f64 },

    #[error("Invalid role identifier: {0}")]
    InvalidRole(String),

    #[error("Unknown decision type: {0}")]
    UnknownDecisionType(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Governance violations require an operator before learning may resume.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, DomainError::DatasetIntegrity { .. })
    }
}
