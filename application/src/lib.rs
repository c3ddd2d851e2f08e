//! Application layer for boardroom
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.
//!
//! - [`use_cases::RunDecisionUseCase`] collects votes from every participating
//!   role concurrently and aggregates them
//! - [`use_cases::DecisionService`] tracks submitted decisions and feeds their
//!   outcomes into the self-learning corpora
//! - [`use_cases::SelfLearningLoop`] curates, retrains, evaluates and deploys
//! - [`use_cases::CapacityUpgradeManager`] moves plateaued roles to a larger tier

pub mod config;
pub mod ports;
pub mod registry;
pub mod use_cases;

// Re-export commonly used types
pub use config::{BoardConfig, EngineParams, LearningParams, UpgradeParams};
pub use ports::{
    evaluation_harness::{EvaluationError, EvaluationHarness, EvaluationRequest},
    event_sink::{EngineEvent, EngineEventSink, NoEventSink},
    feedback_channel::{FeedbackChannelError, MentorFeedbackChannel, NoMentorFeedback},
    judgment_provider::{DomainJudgmentProvider, Judgment, JudgmentError, JudgmentRequest},
    progress::{DecisionProgressNotifier, NoProgress},
    store::{PersistentStore, StoreError},
    training_pipeline::{
        TrainingJobError, TrainingJobId, TrainingJobRequest, TrainingJobStatus, TrainingPipeline,
    },
};
pub use registry::{AdapterFusionRegistry, LearningLedger, RegistryError, RoleLearningState};
pub use use_cases::{
    CapacityUpgradeError, CapacityUpgradeManager, CycleOutcome, CycleReport, DecisionService,
    DecisionServiceError, DecisionStatus, LearningCycleError, RoleStatus, RoleUpgrade,
    RoleUpgradeOutcome, RunDecisionError, RunDecisionUseCase, SelfLearningLoop,
    SynthesizeVoteError, UpgradeReport, VoteSynthesizer,
};
