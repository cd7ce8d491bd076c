//! Subtopic command - grow a saved plan.

use super::write_json;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::schema::Topic;
use crate::tutor::AgentFactory;
use anyhow::{Context, Result};
use console::style;

/// Run the subtopic command.
pub async fn run_subtopic(
    plan: &str,
    parent: &str,
    context: Option<&str>,
    suggest: bool,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    let mut topic = load_topic(plan)?;
    let parent_id = topic
        .resolve_subtopic(parent)
        .with_context(|| format!("No subtopic '{}' in {}", parent, plan))?;

    if let Err(e) = preflight::check(Operation::Completion, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'learnie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let factory = AgentFactory::from_settings(&settings)?;
    let creator = factory.topic_creator();

    if suggest {
        let spinner = Output::spinner("Looking for subtopics to add...");
        let result = creator.suggest_subtopics(&topic, parent_id).await;
        spinner.finish_and_clear();

        Output::header(&format!("Ideas for {}", parent_id));
        for suggestion in result? {
            Output::list_item(&format!(
                "{} {}",
                style(&suggestion.title).bold(),
                style(&suggestion.description).dim()
            ));
        }
        return Ok(());
    }

    let spinner = Output::spinner("Writing a new subtopic...");
    let result = creator.generate_subtopic(&topic, parent_id, context).await;
    spinner.finish_and_clear();

    let subtopic = result?;
    let id = topic.add_subtopic(parent_id.section, subtopic.clone())?;
    Output::success(&format!("Added {} {}", id, subtopic.title));
    if let Some(summary) = &subtopic.summary {
        println!("  {}", style(summary).dim());
    }

    let path = output.as_deref().unwrap_or(plan);
    write_json(path, &topic)?;
    Output::info(&format!("Plan saved to {}", path));
    Ok(())
}

fn load_topic(path: &str) -> Result<Topic> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read plan {}", path))?;
    let topic: Topic = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a learning plan", path))?;
    topic.validate()?;
    Ok(topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_topic_rejects_other_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"title": "Mean", "material": []}}"#).unwrap();
        assert!(load_topic(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_load_topic_missing_file() {
        assert!(load_topic("/nonexistent/plan.json").is_err());
    }
}
