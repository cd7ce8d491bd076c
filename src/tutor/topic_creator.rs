//! Turns a learning request into a [`Topic`] plan, and grows existing plans.

use super::{with_feedback, with_retries};
use crate::agent::{Agent, ToolKind, SEARCH_IMAGES};
use crate::config::Prompts;
use crate::error::{LearnieError, Result};
use crate::schema::{
    describe_clarifications, describe_style, parse_strict, Clarification, LearningStyle, Subtopic,
    SubtopicId, SubtopicSuggestion, Topic, MAX_CLARIFICATIONS, MAX_SUBTOPICS, SUGGESTION_COUNT,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What the learner told us besides the request itself.
#[derive(Debug, Clone, Default)]
pub struct TopicPreferences {
    pub learning_style: Option<LearningStyle>,
    /// Answered clarification questions.
    pub clarifications: Vec<Clarification>,
}

pub struct TopicCreatorAgent {
    agent: Agent,
    prompts: Arc<Prompts>,
    max_retries: usize,
}

impl TopicCreatorAgent {
    pub fn new(agent: Agent, prompts: Arc<Prompts>, max_retries: usize) -> Self {
        Self {
            agent: agent.with_tools(&[ToolKind::SearchImages]),
            prompts,
            max_retries,
        }
    }

    /// Create a topic plan for a learner's request.
    ///
    /// The returned topic's title is the request itself.
    pub async fn create_topic(&self, user_request: &str) -> Result<Topic> {
        self.create_topic_with(user_request, &TopicPreferences::default())
            .await
    }

    /// Create a topic plan shaped by a learning style and clarification answers.
    #[instrument(skip(self, preferences))]
    pub async fn create_topic_with(
        &self,
        user_request: &str,
        preferences: &TopicPreferences,
    ) -> Result<Topic> {
        let request = checked_request(user_request)?;

        let mut vars = HashMap::new();
        vars.insert("request".to_string(), request.to_string());
        vars.insert(
            "learning_style".to_string(),
            describe_style(preferences.learning_style.as_ref()),
        );
        vars.insert(
            "clarifications".to_string(),
            describe_clarifications(&preferences.clarifications),
        );
        let system = self.prompts.render_with_custom(&self.prompts.topic.system, &vars);
        let task = self.prompts.render_with_custom(&self.prompts.topic.user, &vars);
        let agent = self.agent.clone().with_system_prompt(&system);

        with_retries("topic", self.max_retries, |feedback| {
            let agent = &agent;
            let task = with_feedback(&task, feedback.as_deref());
            async move {
                let response = agent.run(&task).await?;
                debug!("Topic response: {}", crate::schema::preview(&response.content));

                let mut topic: Topic = parse_strict(&response.content)?;
                if topic.title != request {
                    debug!("Replacing topic title '{}' with the request", topic.title);
                    topic.title = request.to_string();
                }
                topic.validate()?;
                topic.ensure_images_from(&response.looked_up_images())?;
                topic.learning_style = preferences.learning_style.clone();

                let lookups = response.count_calls(SEARCH_IMAGES);
                if lookups < topic.sections.len() {
                    warn!(
                        "Topic has {} sections but only {} image lookups were made",
                        topic.sections.len(),
                        lookups
                    );
                }

                info!(
                    "Created topic '{}' ({}) with {} sections and {} subtopics",
                    topic.title,
                    topic.subject,
                    topic.sections.len(),
                    topic.subtopics().count()
                );
                Ok(topic)
            }
        })
        .await
    }

    /// Questions that would help plan the request.
    ///
    /// Asks for at most [`MAX_CLARIFICATIONS`] questions in total, counting
    /// the ones already answered. Returns nothing once that many were asked.
    #[instrument(skip(self, answered))]
    pub async fn clarification_questions(
        &self,
        user_request: &str,
        answered: &[Clarification],
    ) -> Result<Vec<Clarification>> {
        let request = checked_request(user_request)?;
        let remaining = MAX_CLARIFICATIONS.saturating_sub(answered.len());
        if remaining == 0 {
            return Ok(Vec::new());
        }

        let mut vars = HashMap::new();
        vars.insert("request".to_string(), request.to_string());
        vars.insert("remaining".to_string(), remaining.to_string());
        vars.insert(
            "clarifications".to_string(),
            describe_clarifications(answered),
        );
        let system = self
            .prompts
            .render_with_custom(&self.prompts.topic.clarify_system, &vars);
        let task = self
            .prompts
            .render_with_custom(&self.prompts.topic.clarify_user, &vars);
        let agent = self.agent.clone().with_tools(&[]).with_system_prompt(&system);

        let asked: HashSet<String> = answered
            .iter()
            .map(|c| c.question.trim().to_lowercase())
            .collect();

        with_retries("clarification questions", self.max_retries, |feedback| {
            let agent = &agent;
            let asked = &asked;
            let task = with_feedback(&task, feedback.as_deref());
            async move {
                let response = agent.run(&task).await?;
                let questions: Vec<Clarification> = parse_strict(&response.content)?;

                if questions.is_empty() || questions.len() > remaining {
                    return Err(LearnieError::violation(format!(
                        "expected 1-{} questions, got {}",
                        remaining,
                        questions.len()
                    )));
                }
                if questions.iter().any(|q| q.question.trim().is_empty()) {
                    return Err(LearnieError::violation("a question is empty"));
                }
                if let Some(repeated) = questions
                    .iter()
                    .find(|q| asked.contains(&q.question.trim().to_lowercase()))
                {
                    return Err(LearnieError::violation(format!(
                        "question '{}' was already asked",
                        repeated.question
                    )));
                }

                debug!("Generated {} clarification questions", questions.len());
                Ok(questions
                    .into_iter()
                    .map(|q| Clarification {
                        question: q.question.trim().to_string(),
                        answer: None,
                    })
                    .collect())
            }
        })
        .await
    }

    /// Generate one new subtopic deepening `parent`.
    ///
    /// The subtopic is meant to be appended to the parent's section, so a
    /// full section is refused before any completion call.
    #[instrument(skip(self, topic, context), fields(parent = %parent))]
    pub async fn generate_subtopic(
        &self,
        topic: &Topic,
        parent: SubtopicId,
        context: Option<&str>,
    ) -> Result<Subtopic> {
        let mut vars = self.parent_vars(topic, parent)?;
        let section = topic
            .section(parent)
            .ok_or_else(|| LearnieError::SubtopicNotFound(parent.to_string()))?;
        if section.subtopics.len() >= MAX_SUBTOPICS {
            return Err(LearnieError::InvalidInput(format!(
                "Section {} ('{}') already has {} subtopics",
                parent.section, section.title, MAX_SUBTOPICS
            )));
        }

        vars.insert(
            "context".to_string(),
            context
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or("(none)")
                .to_string(),
        );
        let system = self
            .prompts
            .render_with_custom(&self.prompts.topic.subtopic_system, &vars);
        let task = self
            .prompts
            .render_with_custom(&self.prompts.topic.subtopic_user, &vars);
        let agent = self.agent.clone().with_tools(&[]).with_system_prompt(&system);
        let location = format!(
            "subtopic {}",
            SubtopicId::new(parent.section, section.subtopics.len() + 1)
        );

        with_retries("subtopic", self.max_retries, |feedback| {
            let agent = &agent;
            let location = &location;
            let task = with_feedback(&task, feedback.as_deref());
            async move {
                let response = agent.run(&task).await?;
                let mut subtopic: Subtopic = parse_strict(&response.content)?;
                subtopic.title = subtopic.title.trim().to_string();
                subtopic.validate(location)?;
                if topic.has_subtopic_titled(&subtopic.title) {
                    return Err(LearnieError::violation(format!(
                        "the plan already has a subtopic titled '{}'",
                        subtopic.title
                    )));
                }

                info!("Generated subtopic '{}' under {}", subtopic.title, parent);
                Ok(subtopic)
            }
        })
        .await
    }

    /// Suggest [`SUGGESTION_COUNT`] new subtopics deepening `parent`.
    #[instrument(skip(self, topic), fields(parent = %parent))]
    pub async fn suggest_subtopics(
        &self,
        topic: &Topic,
        parent: SubtopicId,
    ) -> Result<Vec<SubtopicSuggestion>> {
        let mut vars = self.parent_vars(topic, parent)?;
        vars.insert("count".to_string(), SUGGESTION_COUNT.to_string());
        let system = self
            .prompts
            .render_with_custom(&self.prompts.topic.suggest_system, &vars);
        let task = self
            .prompts
            .render_with_custom(&self.prompts.topic.suggest_user, &vars);
        let agent = self.agent.clone().with_tools(&[]).with_system_prompt(&system);

        with_retries("subtopic suggestions", self.max_retries, |feedback| {
            let agent = &agent;
            let task = with_feedback(&task, feedback.as_deref());
            async move {
                let response = agent.run(&task).await?;
                let suggestions: Vec<SubtopicSuggestion> = parse_strict(&response.content)?;

                if suggestions.len() != SUGGESTION_COUNT {
                    return Err(LearnieError::violation(format!(
                        "expected {} suggestions, got {}",
                        SUGGESTION_COUNT,
                        suggestions.len()
                    )));
                }
                let mut seen = HashSet::new();
                for suggestion in &suggestions {
                    if suggestion.title.trim().is_empty()
                        || suggestion.description.trim().is_empty()
                    {
                        return Err(LearnieError::violation(
                            "every suggestion needs a title and a description",
                        ));
                    }
                    if topic.has_subtopic_titled(&suggestion.title)
                        || !seen.insert(suggestion.title.trim().to_lowercase())
                    {
                        return Err(LearnieError::violation(format!(
                            "suggestion '{}' duplicates an existing subtopic",
                            suggestion.title
                        )));
                    }
                }
                Ok(suggestions)
            }
        })
        .await
    }

    fn parent_vars(&self, topic: &Topic, parent: SubtopicId) -> Result<HashMap<String, String>> {
        let subtopic = topic
            .subtopic(parent)
            .ok_or_else(|| LearnieError::SubtopicNotFound(parent.to_string()))?;

        let mut vars = HashMap::new();
        vars.insert("outline".to_string(), topic.detailed_outline());
        vars.insert(
            "parent".to_string(),
            format!("{} {}", parent, subtopic.title),
        );
        Ok(vars)
    }
}

fn checked_request(user_request: &str) -> Result<&str> {
    let request = user_request.trim();
    if request.is_empty() {
        return Err(LearnieError::InvalidInput(
            "Tell me what you want to learn".to_string(),
        ));
    }
    Ok(request)
}
