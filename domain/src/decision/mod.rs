//! Boardroom decision domain
//!
//! # Flow
//!
//! ```text
//! DecisionRequest ──► per-role synthesis (parallel) ──► Vec<Vote>
//!                                                         │
//!                     RoleWeightProfile ──► aggregate ◄───┘
//!                                              │
//!                                              ▼
//!                                       DecisionOutcome
//!                          (aggregate, consensus, category, rationale)
//! ```
//!
//! Synthesis combines a role's domain judgment (70%) with its purpose
//! alignment (30%). Aggregation takes the mean of
//! `value * weight * confidence` and measures consensus as the spread of
//! raw vote values, then classifies the pair into one of five categories.

pub mod consensus;
pub mod request;
pub mod synthesis;
pub mod track_record;
pub mod vote;
pub mod weighting;

pub use consensus::{DecisionOutcome, OutcomeCategory, VoteContribution, aggregate, consensus_score};
pub use request::{DecisionId, DecisionRequest};
pub use synthesis::{DominantFactor, SynthesisInputs, synthesize};
pub use track_record::{TrackRecord, TrackRecordBook};
pub use vote::Vote;
pub use weighting::{PurposeAlignmentTable, RoleWeightProfile};
