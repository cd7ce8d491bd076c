//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! generations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{LearnieError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Topic plans and materials use completions and image search.
    Illustrated,
    /// Quizzes and games only use completions.
    Completion,
    /// Chat and serve may do either.
    Session,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Illustrated | Operation::Session => {
            check_openai_key()?;
            check_brave_key(settings)?;
        }
        Operation::Completion => {
            check_openai_key()?;
        }
    }
    Ok(())
}

fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(LearnieError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(LearnieError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// The image key may come from the config file or the environment.
fn check_brave_key(settings: &Settings) -> Result<()> {
    let configured = settings
        .image_search
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());
    if configured {
        return Ok(());
    }
    match std::env::var("BRAVE_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(LearnieError::Config(
            "BRAVE_API_KEY not set. Set it with: export BRAVE_API_KEY='...' \
             or image_search.api_key in the config file"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_brave_key_passes() {
        let mut settings = Settings::default();
        settings.image_search.api_key = Some("brave-key".to_string());
        assert!(check_brave_key(&settings).is_ok());
    }
}
