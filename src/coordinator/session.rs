//! Conversation state of a tutoring session.

use crate::schema::SubtopicId;
use serde::Serialize;
use std::fmt;

/// Where a session is in the learning flow.
///
/// After a topic exists any subtopic can be targeted from any state, so the
/// subtopic-carrying states record the most recent target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "subtopic", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    AwaitingTopic,
    TopicReady,
    MaterialRequested(SubtopicId),
    MaterialReady(SubtopicId),
    PracticeRequested(SubtopicId),
    ScoreReported(SubtopicId),
}

impl SessionState {
    pub fn has_topic(&self) -> bool {
        !matches!(self, SessionState::AwaitingTopic)
    }

    /// The subtopic the session last worked on.
    pub fn subtopic(&self) -> Option<SubtopicId> {
        match self {
            SessionState::AwaitingTopic | SessionState::TopicReady => None,
            SessionState::MaterialRequested(id)
            | SessionState::MaterialReady(id)
            | SessionState::PracticeRequested(id)
            | SessionState::ScoreReported(id) => Some(*id),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::AwaitingTopic => write!(f, "awaiting topic"),
            SessionState::TopicReady => write!(f, "topic ready"),
            SessionState::MaterialRequested(id) => write!(f, "material requested for {}", id),
            SessionState::MaterialReady(id) => write!(f, "material ready for {}", id),
            SessionState::PracticeRequested(id) => write!(f, "practice requested for {}", id),
            SessionState::ScoreReported(id) => write!(f, "score reported for {}", id),
        }
    }
}
