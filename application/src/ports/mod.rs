//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod evaluation_harness;
pub mod event_sink;
pub mod feedback_channel;
pub mod judgment_provider;
pub mod progress;
pub mod store;
pub mod training_pipeline;
