//! Content schema for everything the agents produce.
//!
//! Every agent output is parsed into one of these typed records and validated
//! on receipt. Output that does not fit is a [`LearnieError::SchemaViolation`]
//! and the generation is retried by the caller.
//!
//! [`LearnieError::SchemaViolation`]: crate::error::LearnieError::SchemaViolation

mod game;
mod json;
mod material;
mod quiz;
mod style;
mod topic;

pub use game::{GameArtifact, GameScore, PlayEvent, GAME_HEIGHT, GAME_WIDTH, MAX_SCORE, SCORE_RUNTIME};
pub use json::parse_strict;
pub use material::{dominant_keywords, MaterialArticle, MaterialBlock, MAX_BLOCKS, MIN_BLOCKS};
pub use quiz::{QuestionResult, Quiz, QuizAnswer, QuizKind, QuizQuestion, QuizResult};
pub use style::{
    describe_style, LearningPlanType, LearningStyle, MaterialSize, MaterialStyle, QuizDifficulty,
    QuizSize,
};
pub use topic::{
    describe_clarifications, Clarification, Section, Subtopic, SubtopicId, SubtopicSuggestion,
    Topic, MAX_CLARIFICATIONS, MAX_SECTIONS, MAX_SUBTOPICS, MAX_SUMMARY_CHARS, MIN_SECTIONS,
    MIN_SUBTOPICS, SUGGESTION_COUNT,
};

use crate::error::{LearnieError, Result};
use serde::{Deserialize, Deserializer};

/// Deserialize a string field that the model may emit as `null`.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Check that a non-empty image URL is an absolute http(s) URL.
pub(crate) fn check_image_url(url: &str, location: &str) -> Result<()> {
    if url.is_empty() {
        return Ok(());
    }
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(parsed) => Err(LearnieError::violation(format!(
            "{}: image URL has unsupported scheme '{}'",
            location,
            parsed.scheme()
        ))),
        Err(e) => Err(LearnieError::violation(format!(
            "{}: image URL '{}' is not a valid URL ({})",
            location, url, e
        ))),
    }
}

/// Truncate model output for log and error messages.
pub(crate) fn preview(text: &str) -> String {
    text.chars().take(500).collect()
}
