//! Domain layer for boardroom
//!
//! This crate contains the decision and learning logic, entities, and value
//! objects. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Decisions
//!
//! A [`DecisionRequest`] is put to a set of boardroom roles. Each role casts a
//! [`Vote`] synthesized from its domain judgment and its purpose alignment for
//! the decision type; the votes are aggregated into a [`DecisionOutcome`]
//! with one of five [`OutcomeCategory`] values.
//!
//! ## Self-learning
//!
//! Every role owns a [`TrainingCorpus`]: a frozen, sealed `original` corpus
//! and an append-only `self_learning` corpus. Curation snapshots the latter
//! into a [`DatasetVersion`] whose blend never lets feedback exceed 40% of a
//! retraining set. A [`RoleLifecycle`] guards the phase transitions.
//!
//! ## Capacity
//!
//! [`AdapterFusionConfig`] records the adapter mix, [`CapacityTier`] and
//! active [`ModelVersion`] for a role. [`detect_triggers`] decides when a role
//! has plateaued on its current tier.

pub mod adapter;
pub mod config;
pub mod core;
pub mod decision;
pub mod learning;

// Re-export commonly used types
pub use adapter::{
    AdapterFusionConfig, CapacityTier, EvaluationSample, ModelVersion, PlateauCriteria,
    UpgradeTrigger, detect_triggers, mean_overall,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use crate::core::{decision_type::DecisionType, error::DomainError, role::RoleId};
pub use decision::{
    DecisionId, DecisionOutcome, DecisionRequest, DominantFactor, OutcomeCategory,
    PurposeAlignmentTable, RoleWeightProfile, SynthesisInputs, TrackRecord, TrackRecordBook, Vote,
    VoteContribution, aggregate, consensus_score, synthesize,
};
pub use learning::{
    BlendPlan, BlendRatio, CorpusSeal, DatasetVersion, DatasetVersionId, DatasetVersionLog,
    EvaluationScore, ExampleId, ExampleSource, FeedbackLabel, GeneratedSituation, LearningPhase,
    MentorFeedback, NewExample, Provenance, RoleLifecycle, SituationGenerator, SnapshotBoundary,
    TrainingCorpus, TrainingExample, plan_blend,
};
