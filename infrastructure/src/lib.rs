//! Infrastructure layer for boardroom
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod corpus;
pub mod logging;
pub mod providers;
pub mod simulation;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileLearningConfig, FileLoggingConfig, FileOutputConfig,
    FileRoleConfig, FileUpgradeConfig, FileVotingConfig,
};
pub use corpus::{SeedError, SeedRecord, bootstrap_seed, load_seed_file};
pub use logging::JsonlEventLog;
pub use providers::HeuristicJudgmentProvider;
pub use simulation::{LocalTrainingPipeline, ModelCatalog, ModelProfile, SimulatedEvaluationHarness};
pub use store::InMemoryStore;
