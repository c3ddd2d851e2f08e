//! Logging infrastructure: structured audit logging.
//!
//! Provides [`JsonlEventLog`], a JSONL file writer that implements
//! the [`EngineEventSink`](boardroom_application::EngineEventSink) port.

mod jsonl_event_log;

pub use jsonl_event_log::JsonlEventLog;
