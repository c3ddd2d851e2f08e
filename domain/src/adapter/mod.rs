//! Adapter fusion and capacity tiers
//!
//! - [`fusion::AdapterFusionConfig`]: per-role domain/leadership adapter mix
//!   and the model version currently answering for the role
//! - [`upgrade`]: when a role has outgrown its capacity tier

pub mod fusion;
pub mod upgrade;

pub use fusion::{AdapterFusionConfig, CapacityTier, ModelVersion};
pub use upgrade::{EvaluationSample, PlateauCriteria, UpgradeTrigger, detect_triggers, mean_overall};
