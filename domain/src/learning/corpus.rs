//! Append-only training corpus for a single role
//!
//! The corpus holds two sequences:
//!
//! - **original**: seeded once, then sealed. After sealing nothing may be
//!   added, removed or rewritten; every entry's content digest is recorded
//!   in the seal and re-verified before each curation.
//! - **self_learning**: grows monotonically. Entries are never edited; a
//!   revision appends a new entry that `supersedes` the old one.
//!
//! Snapshot boundaries are plain entry counts, so a snapshot taken while
//! other writers append simply excludes the later entries.

use super::blend::{BlendPlan, strided_indices};
use super::example::{
    ExampleId, ExampleSource, FeedbackLabel, MentorFeedback, NewExample, Provenance,
    TrainingExample,
};
use crate::core::{error::DomainError, role::RoleId, time::current_timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Digests of the original corpus at the moment it was frozen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSeal {
    pub sealed_at: u64,
    pub digests: Vec<[u8; 32]>,
}

/// Consistent cut of the self-learning corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotBoundary {
    /// Number of original entries at the cut
    pub original_count: usize,
    /// Number of self-learning entries at the cut
    pub self_learning_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingCorpus {
    role_id: RoleId,
    original: Vec<TrainingExample>,
    seal: Option<CorpusSeal>,
    self_learning: Vec<TrainingExample>,
}

impl TrainingCorpus {
    pub fn new(role_id: RoleId) -> Self {
        Self {
            role_id,
            original: Vec::new(),
            seal: None,
            self_learning: Vec::new(),
        }
    }

    /// Rehydrate a corpus from persisted parts. Integrity is not assumed:
    /// call [`verify_original_integrity`](Self::verify_original_integrity).
    pub fn from_parts(
        role_id: RoleId,
        original: Vec<TrainingExample>,
        seal: Option<CorpusSeal>,
        self_learning: Vec<TrainingExample>,
    ) -> Self {
        Self {
            role_id,
            original,
            seal,
            self_learning,
        }
    }

    pub fn role_id(&self) -> &RoleId {
        &self.role_id
    }

    pub fn is_sealed(&self) -> bool {
        self.seal.is_some()
    }

    pub fn seal_info(&self) -> Option<&CorpusSeal> {
        self.seal.as_ref()
    }

    pub fn original(&self) -> &[TrainingExample] {
        &self.original
    }

    pub fn self_learning(&self) -> &[TrainingExample] {
        &self.self_learning
    }

    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    pub fn self_learning_len(&self) -> usize {
        self.self_learning.len()
    }

    /// Add a baseline example. Only allowed before sealing.
    pub fn seed_original(&mut self, example: NewExample) -> Result<ExampleId, DomainError> {
        if self.is_sealed() {
            return Err(DomainError::DatasetIntegrity {
                example_id: format!("{}-orig-{}", self.role_id, self.original.len() + 1),
                reason: "original corpus is sealed; seeding is closed".to_string(),
            });
        }
        let id = ExampleId::new(format!("{}-orig-{}", self.role_id, self.original.len() + 1));
        let entry = self.materialize(id.clone(), ExampleSource::Original, example, None);
        self.original.push(entry);
        Ok(id)
    }

    /// Freeze the original corpus
    pub fn seal(&mut self) -> &CorpusSeal {
        let digests = self.original.iter().map(TrainingExample::digest).collect();
        self.seal.get_or_insert(CorpusSeal {
            sealed_at: current_timestamp(),
            digests,
        })
    }

    /// Append to the self-learning corpus
    pub fn append_self_learning(&mut self, example: NewExample) -> ExampleId {
        let id = self.next_self_learning_id();
        let entry = self.materialize(id.clone(), ExampleSource::SelfLearning, example, None);
        self.self_learning.push(entry);
        id
    }

    /// Consistent cut for curation
    pub fn snapshot(&self) -> SnapshotBoundary {
        SnapshotBoundary {
            original_count: self.original.len(),
            self_learning_count: self.self_learning.len(),
        }
    }

    /// Recompute every original digest against the seal
    pub fn verify_original_integrity(&self) -> Result<(), DomainError> {
        let Some(seal) = &self.seal else {
            return Err(DomainError::DatasetIntegrity {
                example_id: "<unsealed>".to_string(),
                reason: "original corpus was never sealed".to_string(),
            });
        };
        if self.original.len() < seal.digests.len() {
            let missing = self.original.len() + 1;
            return Err(DomainError::DatasetIntegrity {
                example_id: format!("{}-orig-{}", self.role_id, missing),
                reason: format!(
                    "original corpus shrank from {} to {} entries",
                    seal.digests.len(),
                    self.original.len()
                ),
            });
        }
        if self.original.len() > seal.digests.len() {
            let extra = &self.original[seal.digests.len()];
            return Err(DomainError::DatasetIntegrity {
                example_id: extra.id.to_string(),
                reason: "entry added to the original corpus after sealing".to_string(),
            });
        }
        for (example, sealed) in self.original.iter().zip(&seal.digests) {
            if example.source != ExampleSource::Original || &example.digest() != sealed {
                return Err(DomainError::DatasetIntegrity {
                    example_id: example.id.to_string(),
                    reason: "content digest mismatch".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Apply a batch of mentor feedback atomically.
    ///
    /// Every item is validated before anything is appended: feedback that
    /// targets an original entry aborts the whole batch with a
    /// [`DomainError::DatasetIntegrity`], leaving the corpus untouched.
    /// Feedback for unknown responses is returned in the second list.
    pub fn apply_feedback(
        &mut self,
        batch: &[MentorFeedback],
    ) -> Result<(Vec<ExampleId>, Vec<MentorFeedback>), DomainError> {
        let mut accepted: Vec<(usize, &MentorFeedback)> = Vec::new();
        let mut unknown = Vec::new();

        for feedback in batch {
            if let Some(original) = self.original.iter().find(|e| e.id == feedback.response_id) {
                return Err(DomainError::DatasetIntegrity {
                    example_id: original.id.to_string(),
                    reason: format!(
                        "mentor {} attempted to relabel a frozen original example",
                        feedback.mentor_id
                    ),
                });
            }
            match self
                .self_learning
                .iter()
                .rposition(|e| e.id == feedback.response_id)
            {
                Some(index) => accepted.push((index, feedback)),
                None => unknown.push(feedback.clone()),
            }
        }

        let mut appended = Vec::with_capacity(accepted.len());
        for (index, feedback) in accepted {
            let target = &self.self_learning[index];
            let revision = NewExample {
                situation_text: target.situation_text.clone(),
                response_text: target.response_text.clone(),
                feedback_label: feedback.feedback_label,
                provenance: Provenance {
                    created_at: current_timestamp(),
                    mentor_id: Some(feedback.mentor_id.clone()),
                    decision_id: target.provenance.decision_id.clone(),
                },
            };
            let supersedes = Some(target.id.clone());
            let id = self.next_self_learning_id();
            let revised = self.materialize(id.clone(), ExampleSource::SelfLearning, revision, supersedes);
            self.self_learning.push(revised);
            appended.push(id);
        }

        Ok((appended, unknown))
    }

    /// Self-learning entries within the boundary that no later entry (also
    /// within the boundary) supersedes, oldest first
    pub fn eligible_self_learning(&self, boundary: &SnapshotBoundary) -> Vec<&TrainingExample> {
        let cut = boundary.self_learning_count.min(self.self_learning.len());
        let window = &self.self_learning[..cut];
        let superseded: HashSet<&ExampleId> =
            window.iter().filter_map(|e| e.supersedes.as_ref()).collect();
        window
            .iter()
            .filter(|e| !superseded.contains(&e.id))
            .collect()
    }

    /// Materialize a blend: strided originals plus the most recent eligible
    /// self-learning entries
    pub fn blend(&self, boundary: &SnapshotBoundary, plan: &BlendPlan) -> Vec<TrainingExample> {
        let original_cut = boundary.original_count.min(self.original.len());
        let mut examples: Vec<TrainingExample> = strided_indices(original_cut, plan.original_count)
            .into_iter()
            .map(|i| self.original[i].clone())
            .collect();

        let eligible = self.eligible_self_learning(boundary);
        let skip = eligible.len().saturating_sub(plan.self_learning_count);
        examples.extend(eligible.into_iter().skip(skip).cloned());
        examples
    }

    /// Fraction of labeled self-learning entries marked positive
    pub fn positive_label_share(&self) -> Option<f64> {
        let labeled: Vec<_> = self
            .self_learning
            .iter()
            .filter(|e| e.feedback_label != FeedbackLabel::Unlabeled)
            .collect();
        if labeled.is_empty() {
            return None;
        }
        let positive = labeled
            .iter()
            .filter(|e| e.feedback_label == FeedbackLabel::Positive)
            .count();
        Some(positive as f64 / labeled.len() as f64)
    }

    fn next_self_learning_id(&self) -> ExampleId {
        ExampleId::new(format!("{}-sl-{}", self.role_id, self.self_learning.len() + 1))
    }

    fn materialize(
        &self,
        id: ExampleId,
        source: ExampleSource,
        example: NewExample,
        supersedes: Option<ExampleId>,
    ) -> TrainingExample {
        TrainingExample {
            id,
            source,
            role_id: self.role_id.clone(),
            situation_text: example.situation_text,
            response_text: example.response_text,
            feedback_label: example.feedback_label,
            provenance: example.provenance,
            supersedes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::blend::{BlendRatio, plan_blend};

    fn seeded(originals: usize) -> TrainingCorpus {
        let mut corpus = TrainingCorpus::new(RoleId::Cfo);
        for i in 0..originals {
            corpus
                .seed_original(
                    NewExample::new(format!("situation {}", i), format!("response {}", i))
                        .with_label(FeedbackLabel::Positive),
                )
                .unwrap();
        }
        corpus.seal();
        corpus
    }

    #[test]
    fn test_seed_then_seal() {
        let mut corpus = seeded(3);
        assert!(corpus.is_sealed());
        assert_eq!(corpus.original_len(), 3);
        assert!(corpus.verify_original_integrity().is_ok());

        let err = corpus.seed_original(NewExample::new("late", "late")).unwrap_err();
        assert!(err.is_integrity_violation());
        assert_eq!(corpus.original_len(), 3);
    }

    #[test]
    fn test_unsealed_corpus_fails_verification() {
        let corpus = TrainingCorpus::new(RoleId::Cto);
        assert!(corpus.verify_original_integrity().is_err());
    }

    #[test]
    fn test_tampered_original_detected() {
        let corpus = seeded(2);
        let mut original = corpus.original().to_vec();
        original[1].response_text = "rewritten".to_string();
        let tampered = TrainingCorpus::from_parts(
            RoleId::Cfo,
            original,
            corpus.seal_info().cloned(),
            vec![],
        );

        match tampered.verify_original_integrity() {
            Err(DomainError::DatasetIntegrity { example_id, .. }) => {
                assert_eq!(example_id, "cfo-orig-2");
            }
            other => panic!("expected integrity error, got {:?}", other),
        }
    }

    #[test]
    fn test_shrunk_original_detected() {
        let corpus = seeded(3);
        let shrunk = TrainingCorpus::from_parts(
            RoleId::Cfo,
            corpus.original()[..2].to_vec(),
            corpus.seal_info().cloned(),
            vec![],
        );
        assert!(shrunk.verify_original_integrity().is_err());
    }

    #[test]
    fn test_feedback_on_original_aborts_batch() {
        let mut corpus = seeded(2);
        let sl = corpus.append_self_learning(NewExample::new("s", "r"));
        let before = corpus.self_learning().to_vec();

        let batch = vec![
            MentorFeedback {
                situation_id: "s".to_string(),
                response_id: sl,
                feedback_label: FeedbackLabel::Positive,
                mentor_id: "mentor-1".to_string(),
            },
            MentorFeedback {
                situation_id: "s".to_string(),
                response_id: ExampleId::new("cfo-orig-1"),
                feedback_label: FeedbackLabel::Negative,
                mentor_id: "mentor-1".to_string(),
            },
        ];

        let err = corpus.apply_feedback(&batch).unwrap_err();
        assert!(err.is_integrity_violation());
        assert_eq!(corpus.self_learning(), before.as_slice());
        assert!(corpus.verify_original_integrity().is_ok());
    }

    #[test]
    fn test_feedback_appends_superseding_entry() {
        let mut corpus = seeded(2);
        let first = corpus.append_self_learning(NewExample::new("s1", "r1"));
        corpus.append_self_learning(NewExample::new("s2", "r2"));

        let (appended, unknown) = corpus
            .apply_feedback(&[
                MentorFeedback {
                    situation_id: "s1".to_string(),
                    response_id: first.clone(),
                    feedback_label: FeedbackLabel::Negative,
                    mentor_id: "m".to_string(),
                },
                MentorFeedback {
                    situation_id: "x".to_string(),
                    response_id: ExampleId::new("cfo-sl-99"),
                    feedback_label: FeedbackLabel::Positive,
                    mentor_id: "m".to_string(),
                },
            ])
            .unwrap();

        assert_eq!(appended.len(), 1);
        assert_eq!(unknown.len(), 1);
        assert_eq!(corpus.self_learning_len(), 3);
        // The original first entry is still there, unchanged
        assert_eq!(corpus.self_learning()[0].feedback_label, FeedbackLabel::Unlabeled);

        let revised = &corpus.self_learning()[2];
        assert_eq!(revised.supersedes.as_ref(), Some(&first));
        assert_eq!(revised.provenance.mentor_id.as_deref(), Some("m"));

        let eligible = corpus.eligible_self_learning(&corpus.snapshot());
        assert_eq!(eligible.len(), 2);
        assert!(eligible.iter().all(|e| e.id != first));
    }

    #[test]
    fn test_snapshot_excludes_later_appends() {
        let mut corpus = seeded(10);
        corpus.append_self_learning(NewExample::new("a", "a"));
        let boundary = corpus.snapshot();
        corpus.append_self_learning(NewExample::new("b", "b"));

        assert_eq!(corpus.eligible_self_learning(&boundary).len(), 1);
        assert_eq!(corpus.eligible_self_learning(&corpus.snapshot()).len(), 2);
    }

    #[test]
    fn test_blend_composition() {
        let mut corpus = seeded(100);
        for i in 0..60 {
            corpus.append_self_learning(NewExample::new(format!("s{}", i), "r"));
        }
        let boundary = corpus.snapshot();
        let plan = plan_blend(100, 60, BlendRatio::default()).unwrap();
        let blended = corpus.blend(&boundary, &plan);

        let originals = blended
            .iter()
            .filter(|e| e.source == ExampleSource::Original)
            .count();
        let feedback = blended.len() - originals;
        assert_eq!(originals, plan.original_count);
        assert_eq!(feedback, plan.self_learning_count);
        // Most recent feedback entries are chosen
        assert_eq!(blended.last().unwrap().situation_text, "s59");
    }

    #[test]
    fn test_positive_label_share() {
        let mut corpus = seeded(1);
        assert_eq!(corpus.positive_label_share(), None);
        corpus.append_self_learning(NewExample::new("a", "a").with_label(FeedbackLabel::Positive));
        corpus.append_self_learning(NewExample::new("b", "b").with_label(FeedbackLabel::Negative));
        corpus.append_self_learning(NewExample::new("c", "c"));
        assert_eq!(corpus.positive_label_share(), Some(0.5));
    }
}
