//! Illustrated material for a single subtopic.

use super::{with_feedback, with_retries};
use crate::agent::{Agent, ToolKind, SEARCH_IMAGES};
use crate::config::Prompts;
use crate::error::Result;
use crate::schema::{describe_style, parse_strict, LearningStyle, MaterialArticle};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct MaterialsAgent {
    agent: Agent,
    prompts: Arc<Prompts>,
    max_retries: usize,
    learning_style: Option<LearningStyle>,
}

impl MaterialsAgent {
    pub fn new(agent: Agent, prompts: Arc<Prompts>, max_retries: usize) -> Self {
        Self {
            agent: agent.with_tools(&[ToolKind::SearchImages]),
            prompts,
            max_retries,
            learning_style: None,
        }
    }

    /// Write for a learner's style, usually the one stored on the topic.
    pub fn with_learning_style(mut self, style: Option<LearningStyle>) -> Self {
        self.learning_style = style;
        self
    }

    /// Generate an article for one subtopic.
    ///
    /// Blocks without an image are accepted as they are.
    #[instrument(skip(self, subtopic_summary))]
    pub async fn generate_material(
        &self,
        topic: &str,
        section: &str,
        subtopic_title: &str,
        subtopic_summary: Option<&str>,
    ) -> Result<MaterialArticle> {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), topic.to_string());
        vars.insert("section".to_string(), section.to_string());
        vars.insert("subtopic".to_string(), subtopic_title.to_string());
        vars.insert(
            "summary".to_string(),
            subtopic_summary.unwrap_or("(none)").to_string(),
        );
        vars.insert(
            "learning_style".to_string(),
            describe_style(self.learning_style.as_ref()),
        );
        let system = self.prompts.render_with_custom(&self.prompts.materials.system, &vars);
        let task = self.prompts.render_with_custom(&self.prompts.materials.user, &vars);
        let agent = self.agent.clone().with_system_prompt(&system);

        with_retries("material", self.max_retries, |feedback| {
            let agent = &agent;
            let task = with_feedback(&task, feedback.as_deref());
            async move {
                let response = agent.run(&task).await?;
                debug!("Material response: {}", crate::schema::preview(&response.content));

                let mut article: MaterialArticle = parse_strict(&response.content)?;
                article.normalize();
                article.validate()?;
                article.ensure_images_from(&response.looked_up_images())?;

                let lookups = response.count_calls(SEARCH_IMAGES);
                if lookups < article.material.len() {
                    warn!(
                        "Article has {} blocks but only {} image lookups were made",
                        article.material.len(),
                        lookups
                    );
                }

                let illustrated = article.material.iter().filter(|b| b.image().is_some()).count();
                info!(
                    "Generated material '{}': {} blocks, {} illustrated",
                    article.title,
                    article.material.len(),
                    illustrated
                );
                Ok(article)
            }
        })
        .await
    }
}
