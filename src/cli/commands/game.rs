//! Game command - generate a playable HTML learning game.

use super::load_material;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::schema::{GameArtifact, GAME_HEIGHT, GAME_WIDTH};
use crate::tutor::AgentFactory;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Run the game command.
pub async fn run_game(
    description: &str,
    material_file: &str,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Completion, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'learnie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let material = load_material(material_file)?;
    let factory = AgentFactory::from_settings(&settings)?;

    let spinner = Output::spinner("Building your game...");
    let result = factory
        .game_developer()
        .generate_game(description, &material)
        .await;
    spinner.finish_and_clear();
    let game = result?;

    let path = match output {
        Some(path) => PathBuf::from(path),
        None => settings.games_dir().join(game_file_name(description)),
    };
    save_game(&game, &path)?;

    Output::success(&format!("Game saved to {}", path.display()));
    Output::kv("Canvas", &format!("{}x{}", GAME_WIDTH, GAME_HEIGHT));
    Output::info("Open the file in a browser to play.");

    Ok(())
}

/// Write a game document, creating parent directories as needed.
pub(crate) fn save_game(game: &GameArtifact, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, game.html())
        .with_context(|| format!("Failed to write game to {}", path.display()))?;
    Ok(())
}

/// File name derived from the description plus a timestamp.
pub(crate) fn game_file_name(description: &str) -> String {
    let slug: String = description
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .take(6)
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() { "game".to_string() } else { slug };
    format!("{}-{}.html", slug, chrono::Local::now().format("%Y%m%d-%H%M%S"))
}
