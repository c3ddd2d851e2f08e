//! Domain judgment provider implementations.

mod heuristic;

pub use heuristic::HeuristicJudgmentProvider;
