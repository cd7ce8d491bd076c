//! CLI command implementations.

mod chat;
mod config;
mod doctor;
mod game;
mod material;
mod quiz;
mod serve;
mod subtopic;
mod topic;

pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use game::run_game;
pub use material::run_material;
pub use quiz::run_quiz;
pub use serve::{router, run_serve, AppState};
pub use subtopic::run_subtopic;
pub use topic::run_topic;

use crate::schema::MaterialArticle;
use anyhow::{Context, Result};
use std::path::Path;

/// Read learning material from a file.
///
/// Accepts either a saved article (JSON) or plain text.
fn load_material(path: &str) -> Result<String> {
    let path = Path::new(path);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read material from {}", path.display()))?;

    let text = match serde_json::from_str::<MaterialArticle>(&content) {
        Ok(article) => article.full_text(),
        Err(_) => content.trim().to_string(),
    };

    if text.is_empty() {
        anyhow::bail!("Material file {} is empty", path.display());
    }
    Ok(text)
}

/// Write a value as pretty JSON.
fn write_json<T: serde::Serialize>(path: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path))?;
    Ok(())
}
