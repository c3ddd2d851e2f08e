//! Local stand-ins for the training pipeline and evaluation harness.
//!
//! [`LocalTrainingPipeline`] "trains" by profiling the submitted example
//! set into a [`ModelCatalog`]; [`SimulatedEvaluationHarness`] scores a
//! model version from its catalog profile. Scores grow with the amount and
//! quality of training data and saturate, so a role eventually plateaus on
//! its tier the way a real model would.

mod catalog;
mod harness;
mod pipeline;

pub use catalog::{ModelCatalog, ModelProfile};
pub use harness::SimulatedEvaluationHarness;
pub use pipeline::LocalTrainingPipeline;
