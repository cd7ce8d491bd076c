//! Material command - write an illustrated article for one subtopic.

use super::write_json;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tutor::AgentFactory;
use anyhow::Result;

/// Run the material command.
pub async fn run_material(
    topic: &str,
    section: &str,
    subtopic: &str,
    summary: Option<String>,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Illustrated, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'learnie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let factory = AgentFactory::from_settings(&settings)?;

    let spinner = Output::spinner(&format!("Writing material for \"{}\"...", subtopic));
    let result = factory
        .materials()
        .with_learning_style(settings.learning_style.clone())
        .generate_material(topic, section, subtopic, summary.as_deref())
        .await;
    spinner.finish_and_clear();

    let article = result?;
    Output::article(&article);

    let illustrated = article
        .material
        .iter()
        .filter(|b| b.image().is_some())
        .count();
    Output::success(&format!(
        "{} blocks, {} illustrated",
        article.material.len(),
        illustrated
    ));

    if let Some(path) = output {
        write_json(&path, &article)?;
        Output::info(&format!("Article saved to {}", path));
    }

    Ok(())
}
