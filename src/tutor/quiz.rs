//! Quizzes over a subtopic's material.

use super::{with_feedback, with_retries};
use crate::agent::Agent;
use crate::config::Prompts;
use crate::error::{LearnieError, Result};
use crate::schema::{describe_style, parse_strict, LearningStyle, Quiz, QuizKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Everything the quiz agent knows about the subtopic.
#[derive(Debug, Clone, Default)]
pub struct QuizRequest {
    pub topic: String,
    pub section: String,
    pub subtopic_title: String,
    pub subtopic_summary: Option<String>,
    /// Already generated material, if any.
    pub material: Option<String>,
    pub learning_style: Option<LearningStyle>,
}

pub struct QuizAgent {
    agent: Agent,
    prompts: Arc<Prompts>,
    max_retries: usize,
}

impl QuizAgent {
    pub fn new(agent: Agent, prompts: Arc<Prompts>, max_retries: usize) -> Self {
        Self {
            agent: agent.with_tools(&[]),
            prompts,
            max_retries,
        }
    }

    #[instrument(skip(self, context), fields(subtopic = %context.subtopic_title))]
    pub async fn generate_quiz(&self, context: &QuizRequest, kind: QuizKind) -> Result<Quiz> {
        let mut vars = HashMap::new();
        vars.insert("kind".to_string(), kind.to_string());
        vars.insert("topic".to_string(), context.topic.clone());
        vars.insert("section".to_string(), context.section.clone());
        vars.insert("subtopic".to_string(), context.subtopic_title.clone());
        vars.insert(
            "summary".to_string(),
            context.subtopic_summary.clone().unwrap_or_else(|| "(none)".to_string()),
        );
        vars.insert(
            "material".to_string(),
            context
                .material
                .clone()
                .unwrap_or_else(|| "(no material yet, use the subtopic brief)".to_string()),
        );
        let style = context.learning_style.as_ref();
        vars.insert("learning_style".to_string(), describe_style(style));
        vars.insert(
            "question_count".to_string(),
            style
                .map(|s| s.quiz_size)
                .unwrap_or_default()
                .question_count()
                .to_string(),
        );
        let system = self.prompts.render_with_custom(&self.prompts.quiz.system, &vars);
        let task = self.prompts.render_with_custom(&self.prompts.quiz.user, &vars);
        let agent = self.agent.clone().with_system_prompt(&system);

        with_retries("quiz", self.max_retries, |feedback| {
            let agent = &agent;
            let task = with_feedback(&task, feedback.as_deref());
            async move {
                let response = agent.run(&task).await?;
                debug!("Quiz response: {}", crate::schema::preview(&response.content));

                let quiz: Quiz = parse_strict(&response.content)?;
                if quiz.kind != kind {
                    return Err(LearnieError::violation(format!(
                        "requested a {} quiz but got {}",
                        kind, quiz.kind
                    )));
                }
                quiz.validate()?;

                info!("Generated {} quiz with {} questions", kind, quiz.questions.len());
                Ok(quiz)
            }
        })
        .await
    }
}
