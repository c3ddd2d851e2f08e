//! Self-learning domain: corpora, blending, dataset versions, evaluation
//! and the per-role lifecycle.

pub mod blend;
pub mod corpus;
pub mod dataset;
pub mod evaluation;
pub mod example;
pub mod lifecycle;
pub mod situation;

pub use blend::{BlendPlan, BlendRatio, plan_blend};
pub use corpus::{CorpusSeal, SnapshotBoundary, TrainingCorpus};
pub use dataset::{DatasetVersion, DatasetVersionId, DatasetVersionLog};
pub use evaluation::EvaluationScore;
pub use example::{
    ExampleId, ExampleSource, FeedbackLabel, MentorFeedback, NewExample, Provenance,
    TrainingExample,
};
pub use lifecycle::{LearningPhase, RoleLifecycle};
pub use situation::{GeneratedSituation, SituationGenerator};
