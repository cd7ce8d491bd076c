//! Configuration settings for Learnie.

use crate::schema::LearningStyle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub models: ModelSettings,
    pub generation: GenerationSettings,
    pub image_search: ImageSearchSettings,
    pub progress: ProgressSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
    /// Default preferences for new topics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<LearningStyle>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for generated files such as game HTML.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.learnie".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Chat model per agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Intent classification for free-form learner messages.
    pub coordinator: String,
    pub topic_creator: String,
    pub materials: String,
    pub quiz: String,
    pub game_developer: String,
    /// Sampling temperature for content agents.
    pub temperature: f32,
    /// Lower temperature for topic plans, which must follow a strict structure.
    pub topic_temperature: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            coordinator: "gpt-4o-mini".to_string(),
            topic_creator: "gpt-4o".to_string(),
            materials: "gpt-4o".to_string(),
            quiz: "gpt-4o-mini".to_string(),
            game_developer: "gpt-4o".to_string(),
            temperature: 0.7,
            topic_temperature: 0.4,
        }
    }
}

/// Generation loop limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Extra attempts after the first when output is malformed.
    pub max_retries: usize,
    /// Maximum completion calls within one agent run.
    pub max_tool_iterations: usize,
    /// Timeout for a single completion call.
    pub request_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            max_tool_iterations: 15,
            request_timeout_secs: 300,
        }
    }
}

/// Image search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSearchSettings {
    pub endpoint: String,
    /// Brave API key. Falls back to `BRAVE_API_KEY` when unset.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ImageSearchSettings {
    fn default() -> Self {
        Self {
            endpoint: crate::image_search::DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// Weights used to aggregate progress signals into a 0-100 score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    /// Share of the score earned by viewing the material.
    pub material_weight: u8,
    /// Share of the score earned through practice.
    pub practice_weight: u8,
    /// Minimum quiz percentage counted as passed.
    pub quiz_pass_mark: u8,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            material_weight: 30,
            practice_weight: 70,
            quiz_pass_mark: 70,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.progress.check()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LearnieError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("learnie")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory where generated games are written.
    pub fn games_dir(&self) -> PathBuf {
        self.data_dir().join("games")
    }
}

impl ProgressSettings {
    fn check(&self) -> crate::error::Result<()> {
        let total = self.material_weight as u16 + self.practice_weight as u16;
        if total != 100 {
            return Err(crate::error::LearnieError::Config(format!(
                "progress weights must add up to 100 (material {} + practice {} = {})",
                self.material_weight, self.practice_weight, total
            )));
        }
        if self.quiz_pass_mark > 100 {
            return Err(crate::error::LearnieError::Config(format!(
                "quiz_pass_mark must be at most 100, got {}",
                self.quiz_pass_mark
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.generation.max_retries, 2);
        assert_eq!(settings.progress.material_weight, 30);
        assert_eq!(settings.progress.practice_weight, 70);
        assert!(settings.image_search.endpoint.contains("images/search"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[models]\nquiz = \"gpt-4.1-mini\"\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.models.quiz, "gpt-4.1-mini");
        assert_eq!(settings.models.materials, "gpt-4o");
        assert_eq!(settings.generation.request_timeout_secs, 300);
    }

    #[test]
    fn test_learning_style_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[learning_style]\nmaterialStyle = \"bullet_points\"\nquizSize = \"large\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        let style = settings.learning_style.unwrap();
        assert_eq!(style.material_style, crate::schema::MaterialStyle::BulletPoints);
        assert_eq!(style.quiz_size, crate::schema::QuizSize::Large);
        assert!(Settings::default().learning_style.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.server.port = 9000;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 9000);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[progress]\nmaterial_weight = 50\npractice_weight = 70\n").unwrap();
        assert!(Settings::load_from(Some(&path)).is_err());
    }
}
