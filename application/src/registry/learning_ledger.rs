//! Per-role learning state shared by the decision service, the
//! self-learning loop and the capacity upgrade manager.
//!
//! Each role's state sits behind its own mutex. Accessors take synchronous
//! closures, so a guard can never be held across an await point; callers
//! copy out what they need and release the lock before doing I/O.

use boardroom_domain::{
    DomainError, EvaluationSample, EvaluationScore, ExampleId, MentorFeedback, NewExample, RoleId,
    TrainingCorpus, TrainingExample,
};
use boardroom_domain::{DatasetVersionLog, LearningPhase, RoleLifecycle};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// Everything the learning loop tracks for one role
#[derive(Debug)]
pub struct RoleLearningState {
    pub corpus: TrainingCorpus,
    pub versions: DatasetVersionLog,
    pub lifecycle: RoleLifecycle,
    /// Mentor feedback routed to this role, applied at the next curation
    pub pending_feedback: Vec<MentorFeedback>,
    /// Evaluated cycles on the current tier, oldest first
    pub evaluations: Vec<EvaluationSample>,
    /// Score of the model currently serving the role, once known
    pub deployed_evaluation: Option<EvaluationScore>,
    /// Self-learning entry count covered by the last curation
    pub curated_through: usize,
    pub last_curated_at: Option<Instant>,
    /// A capacity upgrade holds the role; curation waits until it finishes
    pub upgrading: bool,
}

impl RoleLearningState {
    pub fn new(role: RoleId) -> Self {
        Self {
            corpus: TrainingCorpus::new(role),
            versions: DatasetVersionLog::new(),
            lifecycle: RoleLifecycle::new(),
            pending_feedback: Vec::new(),
            evaluations: Vec::new(),
            deployed_evaluation: None,
            curated_through: 0,
            last_curated_at: None,
            upgrading: false,
        }
    }

    /// Self-learning entries appended since the last curation
    pub fn new_examples(&self) -> usize {
        self.corpus.self_learning_len().saturating_sub(self.curated_through)
    }

    /// Whether a response id belongs to either of this role's corpora
    pub fn owns(&self, id: &ExampleId) -> bool {
        self.corpus.original().iter().any(|e| &e.id == id)
            || self.corpus.self_learning().iter().any(|e| &e.id == id)
    }
}

#[derive(Debug, Default)]
pub struct LearningLedger {
    roles: HashMap<RoleId, Mutex<RoleLearningState>>,
}

impl LearningLedger {
    pub fn new(roles: impl IntoIterator<Item = RoleId>) -> Self {
        Self {
            roles: roles
                .into_iter()
                .map(|role| (role.clone(), Mutex::new(RoleLearningState::new(role))))
                .collect(),
        }
    }

    pub fn roles(&self) -> Vec<RoleId> {
        let mut roles: Vec<RoleId> = self.roles.keys().cloned().collect();
        roles.sort();
        roles
    }

    pub fn contains(&self, role: &RoleId) -> bool {
        self.roles.contains_key(role)
    }

    /// Run `f` against a role's state under its lock
    pub fn with_role<R>(
        &self,
        role: &RoleId,
        f: impl FnOnce(&mut RoleLearningState) -> R,
    ) -> Option<R> {
        let state = self.roles.get(role)?;
        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut guard))
    }

    /// Seed and seal a role's original corpus
    pub fn seed_original(
        &self,
        role: &RoleId,
        examples: impl IntoIterator<Item = NewExample>,
    ) -> Result<Vec<TrainingExample>, DomainError> {
        self.with_role(role, |state| {
            let mut ids = Vec::new();
            for example in examples {
                ids.push(state.corpus.seed_original(example)?);
            }
            state.corpus.seal();
            Ok(state
                .corpus
                .original()
                .iter()
                .filter(|e| ids.contains(&e.id))
                .cloned()
                .collect())
        })
        .unwrap_or_else(|| Err(DomainError::InvalidRole(role.to_string())))
    }

    /// Append to a role's self-learning corpus; returns the stored entry
    pub fn append_self_learning(&self, role: &RoleId, example: NewExample) -> Option<TrainingExample> {
        self.with_role(role, |state| {
            let id = state.corpus.append_self_learning(example);
            if !state.lifecycle.phase().is_busy() {
                // Resting roles start collecting; busy or halted ones keep their phase
                let _ = state.lifecycle.resume_collecting();
            }
            state
                .corpus
                .self_learning()
                .iter()
                .rev()
                .find(|e| e.id == id)
                .cloned()
        })
        .flatten()
    }

    /// Reserve a resting role for a capacity upgrade.
    ///
    /// The error is the reason the role cannot be upgraded right now.
    pub fn claim_upgrade(&self, role: &RoleId) -> Result<UpgradeClaim<'_>, String> {
        self.with_role(role, |state| {
            if state.upgrading {
                return Err("an upgrade is already running".to_string());
            }
            let phase = state.lifecycle.phase();
            if phase.is_busy() || phase == LearningPhase::Halted {
                return Err(format!("learning is {}", phase));
            }
            state.upgrading = true;
            Ok(())
        })
        .unwrap_or_else(|| Err("role has no learning state".to_string()))?;

        Ok(UpgradeClaim {
            ledger: self,
            role: role.clone(),
        })
    }

    /// Queue feedback on the role owning each response.
    ///
    /// Returns the feedback whose response no role recognizes.
    pub fn route_feedback(&self, batch: Vec<MentorFeedback>) -> Vec<MentorFeedback> {
        let mut unknown = Vec::new();
        'feedback: for feedback in batch {
            for state in self.roles.values() {
                let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
                if guard.owns(&feedback.response_id) {
                    guard.pending_feedback.push(feedback);
                    continue 'feedback;
                }
            }
            unknown.push(feedback);
        }
        unknown
    }
}

/// Holds a role for a capacity upgrade until dropped
#[derive(Debug)]
pub struct UpgradeClaim<'a> {
    ledger: &'a LearningLedger,
    role: RoleId,
}

impl Drop for UpgradeClaim<'_> {
    fn drop(&mut self) {
        self.ledger.with_role(&self.role, |state| state.upgrading = false);
    }
}
