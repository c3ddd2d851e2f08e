//! Mentor Feedback Channel port

use async_trait::async_trait;
use boardroom_domain::MentorFeedback;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedbackChannelError {
    #[error("Feedback channel unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed feedback: {0}")]
    Malformed(String),
}

/// Source of mentor verdicts on collected responses
#[async_trait]
pub trait MentorFeedbackChannel: Send + Sync {
    /// Take everything received since the last call
    async fn drain(&self) -> Result<Vec<MentorFeedback>, FeedbackChannelError>;
}

/// Channel that never yields feedback
pub struct NoMentorFeedback;

#[async_trait]
impl MentorFeedbackChannel for NoMentorFeedback {
    async fn drain(&self) -> Result<Vec<MentorFeedback>, FeedbackChannelError> {
        Ok(Vec::new())
    }
}
