//! Shared engine state
//!
//! - [`AdapterFusionRegistry`]: active adapter config and model lineage per role
//! - [`LearningLedger`]: corpora, dataset versions and lifecycle per role

pub mod fusion_registry;
pub mod learning_ledger;

pub use fusion_registry::{AdapterFusionRegistry, RegistryError};
pub use learning_ledger::{LearningLedger, RoleLearningState, UpgradeClaim};
