//! Content agents: topic plans, materials, quizzes and games.
//!
//! Each agent wraps an [`Agent`] with its role prompt and toolset, parses the
//! reply into a schema type and retries malformed output a bounded number of
//! times.

mod game_developer;
mod game_ideas;
mod materials;
mod quiz;
mod topic_creator;

pub use game_developer::GameDeveloperAgent;
pub use game_ideas::gameplay_ideas;
pub use materials::MaterialsAgent;
pub use quiz::{QuizAgent, QuizRequest};
pub use topic_creator::{TopicCreatorAgent, TopicPreferences};

use crate::agent::{Agent, ToolContext};
use crate::completion::CompletionService;
use crate::config::{Prompts, Settings};
use crate::error::{LearnieError, Result};
use crate::image_search::{BraveImageSearch, ImageSearch};
use crate::openai::OpenAIChatModel;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run a generation attempt until it succeeds or the retry budget is spent.
///
/// The closure receives feedback describing why the previous attempt was
/// rejected. Only retryable errors are repeated; anything else is returned
/// immediately.
pub async fn with_retries<T, F, Fut>(what: &str, max_retries: usize, mut attempt: F) -> Result<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = max_retries + 1;
    let mut feedback = None;
    let mut last_error = String::new();

    for n in 1..=attempts {
        match attempt(feedback.take()).await {
            Ok(value) => {
                if n > 1 {
                    info!("Generated {} on attempt {}", what, n);
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() => {
                warn!("Attempt {}/{} to generate {} failed: {}", n, attempts, what, e);
                last_error = e.to_string();
                feedback = Some(last_error.clone());
            }
            Err(e) => return Err(e),
        }
    }

    Err(LearnieError::GenerationFailed {
        what: what.to_string(),
        attempts,
        reason: last_error,
    })
}

/// Append retry feedback to a task.
pub(crate) fn with_feedback(task: &str, feedback: Option<&str>) -> String {
    match feedback {
        Some(reason) => format!(
            "{}\n\nYour previous reply was rejected: {}\nReply again and follow the required output format exactly.",
            task, reason
        ),
        None => task.to_string(),
    }
}

/// Builds the tutoring agents from shared services and settings.
#[derive(Clone)]
pub struct AgentFactory {
    completion: Arc<dyn CompletionService>,
    tools: Arc<ToolContext>,
    settings: Settings,
    prompts: Arc<Prompts>,
}

impl AgentFactory {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        image_search: Arc<dyn ImageSearch>,
        settings: Settings,
        prompts: Prompts,
    ) -> Self {
        let tools = ToolContext::new(image_search).with_gameplay_ideas(gameplay_ideas());
        Self {
            completion,
            tools: Arc::new(tools),
            settings,
            prompts: Arc::new(prompts),
        }
    }

    /// Wire OpenAI completions and Brave image search from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let completion = OpenAIChatModel::new(Duration::from_secs(
            settings.generation.request_timeout_secs,
        ))?;
        let image_search = BraveImageSearch::from_settings(&settings.image_search);
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        Ok(Self::new(
            Arc::new(completion),
            Arc::new(image_search),
            settings.clone(),
            prompts,
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    fn agent(&self, name: &str, model: &str) -> Agent {
        let generation = &self.settings.generation;
        Agent::new(name, self.completion.clone(), self.tools.clone(), model)
            .with_max_iterations(generation.max_tool_iterations)
            .with_call_timeout(Duration::from_secs(generation.request_timeout_secs))
            .with_temperature(self.settings.models.temperature)
    }

    pub fn topic_creator(&self) -> TopicCreatorAgent {
        let agent = self
            .agent("topic_creator", &self.settings.models.topic_creator)
            .with_temperature(self.settings.models.topic_temperature);
        TopicCreatorAgent::new(agent, self.prompts.clone(), self.settings.generation.max_retries)
    }

    pub fn materials(&self) -> MaterialsAgent {
        let agent = self.agent("materials", &self.settings.models.materials);
        MaterialsAgent::new(agent, self.prompts.clone(), self.settings.generation.max_retries)
    }

    pub fn quiz(&self) -> QuizAgent {
        let agent = self.agent("quiz", &self.settings.models.quiz);
        QuizAgent::new(agent, self.prompts.clone(), self.settings.generation.max_retries)
    }

    pub fn game_developer(&self) -> GameDeveloperAgent {
        let agent = self.agent("game_developer", &self.settings.models.game_developer);
        GameDeveloperAgent::new(agent, self.prompts.clone(), self.settings.generation.max_retries)
    }

    /// Agent used by the coordinator to classify free-form messages.
    pub fn intent_agent(&self) -> Agent {
        self.agent("coordinator", &self.settings.models.coordinator)
            .with_temperature(0.0)
            .with_max_iterations(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicUsize::new(0);
        let result = with_retries("topic", 2, |feedback| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    assert_eq!(feedback.is_some(), n > 0);
                    Err(LearnieError::violation("fenced"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let result: Result<()> =
            with_retries("material", 2, |_| async { Err(LearnieError::violation("bad")) }).await;
        match result {
            Err(LearnieError::GenerationFailed { what, attempts, .. }) => {
                assert_eq!(what, "material");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_config_error_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retries("topic", 2, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(LearnieError::Config("BRAVE_API_KEY is not set".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(LearnieError::Config(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_feedback() {
        assert_eq!(with_feedback("task", None), "task");
        let task = with_feedback("task", Some("fenced output"));
        assert!(task.starts_with("task\n\n"));
        assert!(task.contains("fenced output"));
    }
}
