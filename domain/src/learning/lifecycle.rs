//! Per-role self-learning lifecycle
//!
//! ```text
//!            ┌──────────────────── failure ─────────────────────┐
//!            ▼                                                   │
//!   Idle ─► Collecting ─► Curating ─► Retraining ─► Evaluating ─┤
//!    ▲                       │                                   ├─► Deployed ──┐
//!    │                       └─ integrity violation ─► Halted    └─► RolledBack ┤
//!    └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Halted` is left only through an explicit operator acknowledgement.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LearningPhase {
    #[default]
    Idle,
    Collecting,
    Curating,
    Retraining,
    Evaluating,
    Deployed,
    RolledBack,
    /// Governance violation detected; requires an operator
    Halted,
}

impl LearningPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningPhase::Idle => "idle",
            LearningPhase::Collecting => "collecting",
            LearningPhase::Curating => "curating",
            LearningPhase::Retraining => "retraining",
            LearningPhase::Evaluating => "evaluating",
            LearningPhase::Deployed => "deployed",
            LearningPhase::RolledBack => "rolled_back",
            LearningPhase::Halted => "halted",
        }
    }

    /// Phases in which a retraining cycle is in flight
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            LearningPhase::Curating | LearningPhase::Retraining | LearningPhase::Evaluating
        )
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: LearningPhase) -> bool {
        use LearningPhase::*;
        match (self, next) {
            (Idle, Collecting) => true,
            (Collecting, Curating) => true,
            (Curating, Retraining) => true,
            (Retraining, Evaluating) => true,
            (Evaluating, Deployed) | (Evaluating, RolledBack) => true,
            (Deployed, Idle) | (Deployed, Collecting) => true,
            (RolledBack, Idle) | (RolledBack, Collecting) => true,
            // Any in-flight failure falls back to Idle
            (Curating | Retraining | Evaluating, Idle) => true,
            (Collecting, Idle) => true,
            (Curating, Halted) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for LearningPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Guarded lifecycle state for one role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleLifecycle {
    phase: LearningPhase,
    last_fault: Option<String>,
    completed_cycles: u32,
}

impl RoleLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LearningPhase {
        self.phase
    }

    pub fn last_fault(&self) -> Option<&str> {
        self.last_fault.as_deref()
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    pub fn transition(&mut self, next: LearningPhase) -> Result<(), DomainError> {
        if !self.phase.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        if matches!(next, LearningPhase::Deployed | LearningPhase::RolledBack) {
            self.completed_cycles += 1;
        }
        self.phase = next;
        Ok(())
    }

    /// Abort an in-flight cycle back to `Idle`, keeping the fault for status reports
    pub fn fail(&mut self, fault: impl Into<String>) -> Result<(), DomainError> {
        self.transition(LearningPhase::Idle)?;
        self.last_fault = Some(fault.into());
        Ok(())
    }

    pub fn halt(&mut self, fault: impl Into<String>) -> Result<(), DomainError> {
        self.transition(LearningPhase::Halted)?;
        self.last_fault = Some(fault.into());
        Ok(())
    }

    /// Operator acknowledgement of a halt
    pub fn clear_halt(&mut self) -> Result<(), DomainError> {
        if self.phase != LearningPhase::Halted {
            return Err(DomainError::InvalidTransition {
                from: self.phase.to_string(),
                to: LearningPhase::Idle.to_string(),
            });
        }
        self.phase = LearningPhase::Idle;
        self.last_fault = None;
        Ok(())
    }

    /// Return to Collecting from any resting phase; busy or halted roles are left alone
    pub fn resume_collecting(&mut self) -> Result<(), DomainError> {
        match self.phase {
            LearningPhase::Collecting => Ok(()),
            LearningPhase::Idle | LearningPhase::Deployed | LearningPhase::RolledBack => {
                self.transition(LearningPhase::Collecting)
            }
            other => Err(DomainError::InvalidTransition {
                from: other.to_string(),
                to: LearningPhase::Collecting.to_string(),
            }),
        }
    }
}
