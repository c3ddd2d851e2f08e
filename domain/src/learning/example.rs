//! Training examples and mentor feedback

use crate::core::{role::RoleId, time::current_timestamp};
use crate::decision::request::DecisionId;
use serde::{Deserialize, Serialize};

/// Identifier of a training example, unique within a role's corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExampleId(String);

impl ExampleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which corpus an example belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleSource {
    /// Frozen baseline, seeded once
    Original,
    /// Grows from decisions, generated situations and mentor feedback
    SelfLearning,
}

impl ExampleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExampleSource::Original => "original",
            ExampleSource::SelfLearning => "self_learning",
        }
    }
}

/// Quality label attached to an example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLabel {
    /// The response is a good example of the role's judgment
    Positive,
    /// The response should not be imitated
    Negative,
    /// Neither, e.g. an unresolved decision
    Neutral,
    /// Awaiting mentor review
    #[default]
    Unlabeled,
}

impl FeedbackLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackLabel::Positive => "positive",
            FeedbackLabel::Negative => "negative",
            FeedbackLabel::Neutral => "neutral",
            FeedbackLabel::Unlabeled => "unlabeled",
        }
    }
}

impl std::str::FromStr for FeedbackLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "good" | "approve" => Ok(FeedbackLabel::Positive),
            "negative" | "bad" | "reject" => Ok(FeedbackLabel::Negative),
            "neutral" => Ok(FeedbackLabel::Neutral),
            "unlabeled" | "" => Ok(FeedbackLabel::Unlabeled),
            other => Err(format!(
                "Unknown feedback label: {}. Valid: positive, negative, neutral, unlabeled",
                other
            )),
        }
    }
}

/// Where an example came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Milliseconds since epoch
    pub created_at: u64,
    pub mentor_id: Option<String>,
    pub decision_id: Option<DecisionId>,
}

impl Provenance {
    pub fn now() -> Self {
        Self {
            created_at: current_timestamp(),
            mentor_id: None,
            decision_id: None,
        }
    }

    pub fn with_mentor(mut self, mentor_id: impl Into<String>) -> Self {
        self.mentor_id = Some(mentor_id.into());
        self
    }

    pub fn with_decision(mut self, decision_id: DecisionId) -> Self {
        self.decision_id = Some(decision_id);
        self
    }
}

/// Example content before a corpus assigns it an id and a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExample {
    pub situation_text: String,
    pub response_text: String,
    pub feedback_label: FeedbackLabel,
    pub provenance: Provenance,
}

impl NewExample {
    pub fn new(situation_text: impl Into<String>, response_text: impl Into<String>) -> Self {
        Self {
            situation_text: situation_text.into(),
            response_text: response_text.into(),
            feedback_label: FeedbackLabel::Unlabeled,
            provenance: Provenance::now(),
        }
    }

    pub fn with_label(mut self, label: FeedbackLabel) -> Self {
        self.feedback_label = label;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}

/// An immutable training example owned by a [`TrainingCorpus`](super::corpus::TrainingCorpus)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub id: ExampleId,
    pub source: ExampleSource,
    pub role_id: RoleId,
    pub situation_text: String,
    pub response_text: String,
    pub feedback_label: FeedbackLabel,
    pub provenance: Provenance,
    /// Earlier self-learning example this one replaces in future blends
    pub supersedes: Option<ExampleId>,
}

impl TrainingExample {
    /// Content digest covering every field that must never change
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        for part in [
            self.id.as_str(),
            self.source.as_str(),
            self.role_id.as_str(),
            self.situation_text.as_str(),
            self.response_text.as_str(),
            self.feedback_label.as_str(),
            self.provenance.mentor_id.as_deref().unwrap_or(""),
            self.provenance.decision_id.as_ref().map(DecisionId::as_str).unwrap_or(""),
        ] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.update(&self.provenance.created_at.to_le_bytes());
        *hasher.finalize().as_bytes()
    }
}

/// A mentor's verdict on a previously collected response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorFeedback {
    pub situation_id: String,
    /// Example id of the response being judged
    pub response_id: ExampleId,
    pub feedback_label: FeedbackLabel,
    pub mentor_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> TrainingExample {
        TrainingExample {
            id: ExampleId::new("cfo-orig-1"),
            source: ExampleSource::Original,
            role_id: RoleId::Cfo,
            situation_text: "Budget cut".to_string(),
            response_text: "Protect runway".to_string(),
            feedback_label: FeedbackLabel::Positive,
            provenance: Provenance {
                created_at: 1,
                mentor_id: None,
                decision_id: None,
            },
            supersedes: None,
        }
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(example().digest(), example().digest());
    }

    #[test]
    fn test_digest_detects_content_change() {
        let mut changed = example();
        changed.response_text.push('!');
        assert_ne!(example().digest(), changed.digest());
    }

    #[test]
    fn test_digest_is_field_delimited() {
        let mut a = example();
        a.situation_text = "ab".to_string();
        a.response_text = "c".to_string();
        let mut b = example();
        b.situation_text = "a".to_string();
        b.response_text = "bc".to_string();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_parse_feedback_label() {
        assert_eq!("Good".parse::<FeedbackLabel>().unwrap(), FeedbackLabel::Positive);
        assert_eq!("reject".parse::<FeedbackLabel>().unwrap(), FeedbackLabel::Negative);
        assert!("meh".parse::<FeedbackLabel>().is_err());
    }
}
