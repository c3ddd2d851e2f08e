//! Loading original examples for a role
//!
//! A seed file is JSONL, one `{"situation": .., "response": .., "label": ..}`
//! object per line. Roles without a seed file can be bootstrapped from the
//! situation templates answered by the heuristic provider.

use crate::providers::HeuristicJudgmentProvider;
use boardroom_domain::{AdapterFusionConfig, DecisionType, FeedbackLabel, NewExample, SituationGenerator};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read seed corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Seed corpus {0} contains no examples")]
    Empty(PathBuf),
}

/// One line of a seed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub situation: String,
    pub response: String,
    #[serde(default)]
    pub label: FeedbackLabel,
    #[serde(default)]
    pub mentor_id: Option<String>,
}

impl From<SeedRecord> for NewExample {
    fn from(record: SeedRecord) -> Self {
        let example = NewExample::new(record.situation, record.response).with_label(record.label);
        match record.mentor_id {
            Some(mentor) => {
                let provenance = example.provenance.clone().with_mentor(mentor);
                example.with_provenance(provenance)
            }
            None => example,
        }
    }
}

/// Read every record of a seed file; blank lines are skipped
pub fn load_seed_file(path: &Path) -> Result<Vec<NewExample>, SeedError> {
    let file = std::fs::File::open(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut examples = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record: SeedRecord =
            serde_json::from_str(&line).map_err(|source| SeedError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
        examples.push(record.into());
    }

    if examples.is_empty() {
        return Err(SeedError::Empty(path.to_path_buf()));
    }
    debug!("Loaded {} seed examples from {}", examples.len(), path.display());
    Ok(examples)
}

/// Generate `count` original examples for a role from the situation templates
pub fn bootstrap_seed(
    provider: &HeuristicJudgmentProvider,
    adapter: &AdapterFusionConfig,
    count: usize,
) -> Vec<NewExample> {
    let mut generator = SituationGenerator::new();
    generator
        .generate(&DecisionType::ALL, count)
        .into_iter()
        .map(|situation| {
            let judgment = provider.judge(adapter, &situation.text);
            NewExample::new(situation.situation_text(), judgment.rationale)
                .with_label(FeedbackLabel::Positive)
        })
        .collect()
}
