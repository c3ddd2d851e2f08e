//! Synthetic decision situations for self-learning collection
//!
//! Situations are built from fixed templates per decision type, filled with
//! a rotating set of subjects and magnitudes. Generation is deterministic:
//! the same generator state always yields the same sequence.

use crate::core::decision_type::DecisionType;
use serde::{Deserialize, Serialize};

/// A generated situation, ready to be answered by a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSituation {
    pub situation_id: String,
    pub decision_type: DecisionType,
    pub text: String,
}

impl GeneratedSituation {
    /// Text in the same shape as a real request's situation
    pub fn situation_text(&self) -> String {
        format!("[{}] {}", self.decision_type, self.text)
    }
}

const SUBJECTS: [&str; 6] = [
    "the European expansion",
    "the flagship analytics product",
    "the north-american sales region",
    "the legacy billing platform",
    "the new subscription tier",
    "the partner integration program",
];

const MAGNITUDES: [&str; 4] = ["2M", "5M", "12M", "30M"];

fn templates(decision_type: DecisionType) -> &'static [&'static str] {
    match decision_type {
        DecisionType::Investment => &[
            "Invest {m} in {s} with an expected payback of three years",
            "Acquire a competitor to accelerate {s} for {m}",
            "Fund a {m} pilot for {s} before committing to a full rollout",
        ],
        DecisionType::Strategic => &[
            "Reposition {s} as the company's primary growth engine",
            "Exit {s} to focus resources on the core market",
            "Form a joint venture around {s}",
        ],
        DecisionType::Financial => &[
            "Raise {m} in debt to extend runway for {s}",
            "Cut the operating budget of {s} by fifteen percent",
            "Reallocate {m} of reserves to {s}",
        ],
        DecisionType::Technical => &[
            "Rewrite {s} on a new platform over eighteen months",
            "Migrate {s} to a managed cloud provider",
            "Adopt an open-source stack for {s} and retire the vendor license",
        ],
        DecisionType::Operational => &[
            "Outsource support operations for {s}",
            "Consolidate the teams running {s} into one site",
            "Introduce a weekly release cadence for {s}",
        ],
        DecisionType::Governance => &[
            "Add an independent audit committee review for {s}",
            "Adopt a data-retention policy covering {s}",
            "Require board approval for any commitment above {m} in {s}",
        ],
    }
}

/// Deterministic template-based situation source
#[derive(Debug, Clone, Default)]
pub struct SituationGenerator {
    cursor: u64,
}

impl SituationGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary position, e.g. one persisted from a previous run
    pub fn starting_at(cursor: u64) -> Self {
        Self { cursor }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Produce `count` situations, cycling through the given decision types
    pub fn generate(&mut self, decision_types: &[DecisionType], count: usize) -> Vec<GeneratedSituation> {
        let types: &[DecisionType] = if decision_types.is_empty() {
            &DecisionType::ALL
        } else {
            decision_types
        };

        (0..count)
            .map(|_| {
                let n = self.cursor;
                self.cursor += 1;
                let decision_type = types[(n % types.len() as u64) as usize];
                let pool = templates(decision_type);
                let template = pool[((n / types.len() as u64) % pool.len() as u64) as usize];
                let subject = SUBJECTS[(n % SUBJECTS.len() as u64) as usize];
                let magnitude = MAGNITUDES[((n / 3) % MAGNITUDES.len() as u64) as usize];
                GeneratedSituation {
                    situation_id: format!("sit-{}-{}", decision_type, n + 1),
                    decision_type,
                    text: template.replace("{s}", subject).replace("{m}", magnitude),
                }
            })
            .collect()
    }
}
