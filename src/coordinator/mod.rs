//! The tutor coordinator: session state, intent routing and progress.
//!
//! A [`TutorCoordinator`] owns everything a session produces: the topic tree,
//! the generated articles, the issued quizzes and the learning signals. Each
//! turn invokes at most one content agent.

mod intent;
mod progress;
mod session;

pub use intent::{Intent, IntentClassifier, PracticeKind};
pub use progress::{
    PracticeRecord, PracticeSource, ProgressPolicy, ProgressReport, ProgressTracker,
    SubtopicSignals,
};
pub use session::SessionState;

use crate::config::Settings;
use crate::error::{LearnieError, Result};
use crate::schema::{
    Clarification, GameArtifact, GameScore, LearningStyle, MaterialArticle, Quiz, QuizAnswer,
    QuizKind, QuizResult, Subtopic, SubtopicId, SubtopicSuggestion, Topic,
};
use crate::tutor::{AgentFactory, QuizRequest, TopicPreferences};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The coordinator's answer to one learner turn.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TutorReply {
    TopicCreated { topic: Topic },
    Material { subtopic: SubtopicId, article: MaterialArticle },
    Quiz { subtopic: SubtopicId, quiz: Quiz },
    Game { subtopic: SubtopicId, game: GameArtifact },
    Progress { report: ProgressReport },
    Message { text: String },
    TryAgain { text: String },
}

impl TutorReply {
    fn message(text: impl Into<String>) -> Self {
        TutorReply::Message { text: text.into() }
    }
}

const NO_TOPIC: &str =
    "There is no learning plan yet. Create a topic first, for example: \"I want to learn basic statistics\".";

/// Drives one learner's session.
pub struct TutorCoordinator {
    factory: AgentFactory,
    classifier: IntentClassifier,
    topic: Option<Topic>,
    materials: HashMap<SubtopicId, MaterialArticle>,
    quizzes: HashMap<SubtopicId, Quiz>,
    progress: ProgressTracker,
    state: SessionState,
    quiz_pass_mark: u8,
    default_style: Option<LearningStyle>,
}

impl TutorCoordinator {
    pub fn new(factory: AgentFactory) -> Self {
        let settings = factory.settings();
        let progress = ProgressTracker::new(ProgressPolicy::from(&settings.progress));
        let quiz_pass_mark = settings.progress.quiz_pass_mark;
        let default_style = settings.learning_style.clone();
        let classifier =
            IntentClassifier::new(factory.intent_agent(), Arc::new(factory.prompts().clone()));
        Self {
            factory,
            classifier,
            topic: None,
            materials: HashMap::new(),
            quizzes: HashMap::new(),
            progress,
            state: SessionState::AwaitingTopic,
            quiz_pass_mark,
            default_style,
        }
    }

    /// Build a coordinator backed by OpenAI and Brave.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(AgentFactory::from_settings(settings)?))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    /// The latest article generated for a subtopic.
    pub fn material(&self, id: SubtopicId) -> Option<&MaterialArticle> {
        self.materials.get(&id)
    }

    /// The quiz currently awaiting answers for a subtopic.
    pub fn quiz(&self, id: SubtopicId) -> Option<&Quiz> {
        self.quizzes.get(&id)
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Handle one learner message.
    ///
    /// Generation and lookup problems become user-facing replies. Only
    /// configuration errors are returned.
    #[instrument(skip(self))]
    pub async fn handle(&mut self, message: &str) -> Result<TutorReply> {
        let outline = self.topic.as_ref().map(Topic::outline);
        let intent = match self.classifier.classify(message, outline.as_deref()).await {
            Ok(intent) => intent,
            Err(e @ LearnieError::Config(_)) => return Err(e),
            Err(e) => {
                warn!("Intent classification failed: {}", e);
                return Ok(TutorReply::TryAgain {
                    text: "I couldn't understand that right now, please try again.".to_string(),
                });
            }
        };

        info!("Handling intent {:?} in state '{}'", intent, self.state);

        if intent.needs_topic() && self.topic.is_none() {
            return Ok(TutorReply::message(NO_TOPIC));
        }

        let outcome = match intent {
            Intent::CreateTopic { request } => self
                .create_topic(&request)
                .await
                .map(|topic| TutorReply::TopicCreated {
                    topic: topic.clone(),
                }),
            Intent::FetchMaterial { subtopic } => {
                self.fetch_material(&subtopic)
                    .await
                    .map(|(id, article)| TutorReply::Material {
                        subtopic: id,
                        article,
                    })
            }
            Intent::RequestPractice {
                subtopic,
                practice: PracticeKind::Quiz(kind),
            } => self
                .request_quiz(&subtopic, kind)
                .await
                .map(|(id, quiz)| TutorReply::Quiz { subtopic: id, quiz }),
            Intent::RequestPractice {
                subtopic,
                practice: PracticeKind::Game { description },
            } => self
                .request_game(&subtopic, description.as_deref())
                .await
                .map(|(id, game)| TutorReply::Game { subtopic: id, game }),
            Intent::ReportProgress { subtopic } => self
                .resolve(&subtopic)
                .map(|id| TutorReply::Progress {
                    report: self.progress_report(id),
                }),
            Intent::Unrecognized => Ok(TutorReply::message(
                self.factory.prompts().coordinator.help.clone(),
            )),
        };

        match outcome {
            Ok(reply) => Ok(reply),
            Err(e @ LearnieError::Config(_)) => Err(e),
            Err(LearnieError::GenerationFailed { what, .. }) => Ok(TutorReply::TryAgain {
                text: format!("I couldn't generate the {}, please try again.", what),
            }),
            Err(e) => Ok(TutorReply::message(e.to_string())),
        }
    }

    /// Replace the session's topic with a new plan.
    pub async fn create_topic(&mut self, request: &str) -> Result<&Topic> {
        self.create_topic_with(request, &TopicPreferences::default())
            .await
    }

    /// Replace the session's topic with a plan shaped by the learner's
    /// style and clarification answers.
    ///
    /// Without a style in `preferences` the configured default style is used.
    pub async fn create_topic_with(
        &mut self,
        request: &str,
        preferences: &TopicPreferences,
    ) -> Result<&Topic> {
        let preferences = TopicPreferences {
            learning_style: preferences
                .learning_style
                .clone()
                .or_else(|| self.default_style.clone()),
            clarifications: preferences.clarifications.clone(),
        };
        let topic = self
            .factory
            .topic_creator()
            .create_topic_with(request, &preferences)
            .await?;

        self.materials.clear();
        self.quizzes.clear();
        self.progress.clear();
        self.state = SessionState::TopicReady;

        Ok(self.topic.insert(topic))
    }

    /// Questions to ask before planning `request`.
    pub async fn clarification_questions(
        &self,
        request: &str,
        answered: &[Clarification],
    ) -> Result<Vec<Clarification>> {
        self.factory
            .topic_creator()
            .clarification_questions(request, answered)
            .await
    }

    /// Generate a subtopic deepening `reference` and append it to its section.
    pub async fn add_subtopic(
        &mut self,
        reference: &str,
        context: Option<&str>,
    ) -> Result<(SubtopicId, Subtopic)> {
        let parent = self.resolve(reference)?;
        let topic = self.current_topic()?;
        let subtopic = self
            .factory
            .topic_creator()
            .generate_subtopic(topic, parent, context)
            .await?;

        let topic = self
            .topic
            .as_mut()
            .ok_or_else(|| LearnieError::InvalidInput(NO_TOPIC.to_string()))?;
        let id = topic.add_subtopic(parent.section, subtopic.clone())?;
        info!("Added subtopic {} '{}'", id, subtopic.title);
        Ok((id, subtopic))
    }

    /// Suggest subtopics deepening `reference` without changing the plan.
    pub async fn suggest_subtopics(&self, reference: &str) -> Result<Vec<SubtopicSuggestion>> {
        let parent = self.resolve(reference)?;
        self.factory
            .topic_creator()
            .suggest_subtopics(self.current_topic()?, parent)
            .await
    }

    /// Generate an article for a subtopic and count it as viewed.
    pub async fn fetch_material(&mut self, reference: &str) -> Result<(SubtopicId, MaterialArticle)> {
        let id = self.resolve(reference)?;
        let (topic_title, section_title, subtopic_title, summary) = self.describe(id)?;

        let previous = self.begin(SessionState::MaterialRequested(id));
        let result = self
            .factory
            .materials()
            .with_learning_style(self.learning_style())
            .generate_material(&topic_title, &section_title, &subtopic_title, summary.as_deref())
            .await;
        let article = self.settle(previous, result)?;

        self.materials.insert(id, article.clone());
        self.progress.record_material_viewed(id);
        self.state = SessionState::MaterialReady(id);
        Ok((id, article))
    }

    /// Generate a quiz for a subtopic. The quiz is kept for grading.
    pub async fn request_quiz(
        &mut self,
        reference: &str,
        kind: QuizKind,
    ) -> Result<(SubtopicId, Quiz)> {
        let id = self.resolve(reference)?;
        let (topic, section, subtopic_title, subtopic_summary) = self.describe(id)?;
        let request = QuizRequest {
            topic,
            section,
            subtopic_title,
            subtopic_summary,
            material: self.materials.get(&id).map(MaterialArticle::full_text),
            learning_style: self.learning_style(),
        };

        let previous = self.begin(SessionState::PracticeRequested(id));
        let result = self.factory.quiz().generate_quiz(&request, kind).await;
        let quiz = self.settle(previous, result)?;

        self.quizzes.insert(id, quiz.clone());
        Ok((id, quiz))
    }

    /// Generate a game for a subtopic.
    ///
    /// Uses the subtopic's latest article, or its brief when no article exists.
    pub async fn request_game(
        &mut self,
        reference: &str,
        description: Option<&str>,
    ) -> Result<(SubtopicId, GameArtifact)> {
        let id = self.resolve(reference)?;
        let (_, _, subtopic_title, summary) = self.describe(id)?;

        let material = match self.materials.get(&id) {
            Some(article) => article.full_text(),
            None => format!(
                "{}\n\n{}",
                subtopic_title,
                summary.unwrap_or_default()
            ),
        };
        let description = description
            .map(str::to_string)
            .unwrap_or_else(|| format!("A quick game to practice \"{}\"", subtopic_title));

        let previous = self.begin(SessionState::PracticeRequested(id));
        let result = self
            .factory
            .game_developer()
            .generate_game(&description, &material)
            .await;
        let game = self.settle(previous, result)?;
        Ok((id, game))
    }

    /// Grade answers to the subtopic's current quiz and record the score.
    pub fn record_quiz_answers(
        &mut self,
        id: SubtopicId,
        answers: &[QuizAnswer],
    ) -> Result<QuizResult> {
        self.require_subtopic(id)?;
        let quiz = self.quizzes.get(&id).ok_or_else(|| {
            LearnieError::InvalidInput(format!("No quiz has been issued for subtopic {}", id))
        })?;

        let result = quiz.grade(answers, self.quiz_pass_mark)?;
        self.progress
            .record_practice(id, PracticeSource::Quiz, result.score);
        self.state = SessionState::ScoreReported(id);

        info!(
            "Quiz for {} graded: {}/{} ({}%)",
            id, result.correct, result.total, result.score
        );
        Ok(result)
    }

    /// Record a score reported by a game. Out-of-range values are clamped.
    pub fn record_game_score(&mut self, id: SubtopicId, score: i64) -> Result<u8> {
        self.require_subtopic(id)?;
        let score = GameScore::new(score).value();
        self.progress.record_practice(id, PracticeSource::Game, score);
        self.state = SessionState::ScoreReported(id);

        info!("Game score for {} recorded: {}", id, score);
        Ok(score)
    }

    /// Current mastery score for a subtopic.
    pub fn report_progress(&self, id: SubtopicId) -> Result<u8> {
        self.require_subtopic(id)?;
        Ok(self.progress.score(id))
    }

    /// Enter a request state and return the state to fall back to.
    fn begin(&mut self, requested: SessionState) -> SessionState {
        std::mem::replace(&mut self.state, requested)
    }

    /// A failed request leaves the session where it was before.
    fn settle<T>(&mut self, previous: SessionState, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = previous;
        }
        result
    }

    fn progress_report(&self, id: SubtopicId) -> ProgressReport {
        self.progress.report(id)
    }

    fn current_topic(&self) -> Result<&Topic> {
        self.topic
            .as_ref()
            .ok_or_else(|| LearnieError::InvalidInput(NO_TOPIC.to_string()))
    }

    fn learning_style(&self) -> Option<LearningStyle> {
        self.topic.as_ref().and_then(|t| t.learning_style.clone())
    }

    /// Resolve a learner's subtopic reference against the current topic.
    pub fn resolve(&self, reference: &str) -> Result<SubtopicId> {
        let topic = self
            .topic
            .as_ref()
            .ok_or_else(|| LearnieError::InvalidInput(NO_TOPIC.to_string()))?;
        topic
            .resolve_subtopic(reference)
            .ok_or_else(|| LearnieError::SubtopicNotFound(reference.to_string()))
    }

    fn require_subtopic(&self, id: SubtopicId) -> Result<()> {
        let topic = self
            .topic
            .as_ref()
            .ok_or_else(|| LearnieError::InvalidInput(NO_TOPIC.to_string()))?;
        topic
            .subtopic(id)
            .map(|_| ())
            .ok_or_else(|| LearnieError::SubtopicNotFound(id.to_string()))
    }

    /// Topic title, section title, subtopic title and summary for a subtopic.
    fn describe(&self, id: SubtopicId) -> Result<(String, String, String, Option<String>)> {
        let topic = self
            .topic
            .as_ref()
            .ok_or_else(|| LearnieError::InvalidInput(NO_TOPIC.to_string()))?;
        let section = topic
            .section(id)
            .ok_or_else(|| LearnieError::SubtopicNotFound(id.to_string()))?;
        let subtopic = topic
            .subtopic(id)
            .ok_or_else(|| LearnieError::SubtopicNotFound(id.to_string()))?;
        Ok((
            topic.title.clone(),
            section.title.clone(),
            subtopic.title.clone(),
            subtopic.summary.clone(),
        ))
    }
}
