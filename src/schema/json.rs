//! Strict JSON framing for agent output.

use super::preview;
use crate::error::{LearnieError, Result};
use serde::de::DeserializeOwned;

/// Parse an agent reply that must consist of exactly one JSON value.
///
/// Surrounding whitespace is tolerated. Fenced code blocks, leading prose and
/// trailing text are rejected.
pub fn parse_strict<T: DeserializeOwned>(response: &str) -> Result<T> {
    let trimmed = response.trim();

    if trimmed.is_empty() {
        return Err(LearnieError::violation("empty response"));
    }

    if trimmed.starts_with("```") {
        return Err(LearnieError::violation(
            "output is wrapped in a fenced code block",
        ));
    }

    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return Err(LearnieError::violation(format!(
            "output must be a single JSON value without surrounding prose. Response was: {}",
            preview(trimmed)
        )));
    }

    serde_json::from_str(trimmed).map_err(|e| {
        LearnieError::violation(format!(
            "invalid JSON: {}. Response was: {}",
            e,
            preview(trimmed)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Score {
        score: u8,
    }

    #[test]
    fn test_parse_plain_object() {
        let parsed: Score = parse_strict("  {\"score\": 70}\n").unwrap();
        assert_eq!(parsed.score, 70);
    }

    #[test]
    fn test_rejects_fenced_output() {
        let response = "```json\n{\"score\": 70}\n```";
        let err = parse_strict::<Score>(response).unwrap_err();
        assert!(matches!(err, LearnieError::SchemaViolation(_)));
        assert!(err.to_string().contains("fenced"));
    }

    #[test]
    fn test_rejects_leading_prose() {
        let response = "Here is your score: {\"score\": 70}";
        assert!(matches!(
            parse_strict::<Score>(response),
            Err(LearnieError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_rejects_trailing_prose() {
        let response = "{\"score\": 70} Hope this helps!";
        assert!(matches!(
            parse_strict::<Score>(response),
            Err(LearnieError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_rejects_bad_escaping() {
        let response = r#"{"title": "The "Cubism" movement"}"#;
        assert!(matches!(
            parse_strict::<serde_json::Value>(response),
            Err(LearnieError::SchemaViolation(_))
        ));
    }
}
