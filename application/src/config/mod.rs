//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`EngineParams`]: judgment timeout, collection window, retries
//! - [`LearningParams`]: curation cadence, training polling, regression tolerance
//! - [`UpgradeParams`]: plateau detection and tier promotion
//! - [`BoardConfig`]: container holding all of the above plus the voting tables

pub mod board_config;
pub mod engine_params;
pub mod learning_params;
pub mod upgrade_params;

pub use board_config::BoardConfig;
pub use engine_params::EngineParams;
pub use learning_params::LearningParams;
pub use upgrade_params::UpgradeParams;
