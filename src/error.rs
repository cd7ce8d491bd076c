//! Error types for Learnie.

use thiserror::Error;

/// Library-level error type for Learnie operations.
#[derive(Error, Debug)]
pub enum LearnieError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image provider error: {0}")]
    ImageProvider(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Could not generate {what} after {attempts} attempt(s): {reason}")]
    GenerationFailed {
        what: String,
        attempts: usize,
        reason: String,
    },

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Subtopic not found: {0}")]
    SubtopicNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LearnieError {
    /// Whether a generation attempt that failed with this error may be repeated.
    ///
    /// Malformed output and completion-service hiccups are retried; configuration
    /// problems and caller mistakes are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LearnieError::SchemaViolation(_)
                | LearnieError::Completion(_)
                | LearnieError::OpenAI(_)
                | LearnieError::Timeout(_)
                | LearnieError::Agent(_)
        )
    }

    /// Shorthand for building a schema violation.
    pub fn violation(msg: impl Into<String>) -> Self {
        LearnieError::SchemaViolation(msg.into())
    }
}

/// Result type alias for Learnie operations.
pub type Result<T> = std::result::Result<T, LearnieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LearnieError::violation("fenced output").is_retryable());
        assert!(LearnieError::Timeout(30).is_retryable());
        assert!(!LearnieError::Config("BRAVE_API_KEY not set".into()).is_retryable());
        assert!(!LearnieError::SubtopicNotFound("9.9".into()).is_retryable());
    }

    #[test]
    fn test_generation_failed_message() {
        let err = LearnieError::GenerationFailed {
            what: "material".to_string(),
            attempts: 3,
            reason: "bad json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not generate material after 3 attempt(s): bad json"
        );
    }
}
