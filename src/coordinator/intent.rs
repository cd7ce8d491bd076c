//! Intent routing for learner messages.

use crate::agent::Agent;
use crate::config::Prompts;
use crate::error::{LearnieError, Result};
use crate::schema::{parse_strict, QuizKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// The kind of practice a learner asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum PracticeKind {
    Quiz(QuizKind),
    Game { description: Option<String> },
}

/// What the learner wants from the current turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    CreateTopic { request: String },
    FetchMaterial { subtopic: String },
    RequestPractice { subtopic: String, practice: PracticeKind },
    ReportProgress { subtopic: String },
    Unrecognized,
}

impl Intent {
    /// Whether acting on this intent needs an existing topic.
    pub fn needs_topic(&self) -> bool {
        matches!(
            self,
            Intent::FetchMaterial { .. }
                | Intent::RequestPractice { .. }
                | Intent::ReportProgress { .. }
        )
    }

    /// Parse a slash command such as `/material 1.2`.
    ///
    /// Returns `None` for messages that are not commands.
    pub fn parse_command(message: &str) -> Option<Intent> {
        let message = message.trim();
        let rest = message.strip_prefix('/')?;
        let (command, args) = match rest.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (rest, ""),
        };

        let intent = match command.to_lowercase().as_str() {
            "topic" | "learn" if !args.is_empty() => Intent::CreateTopic {
                request: args.to_string(),
            },
            "material" | "study" if !args.is_empty() => Intent::FetchMaterial {
                subtopic: args.to_string(),
            },
            "progress" if !args.is_empty() => Intent::ReportProgress {
                subtopic: args.to_string(),
            },
            "quiz" if !args.is_empty() => {
                let (subtopic, kind) = split_first(args);
                let kind = match kind.map(|k| k.parse::<QuizKind>()) {
                    Some(Ok(kind)) => kind,
                    Some(Err(_)) => return Some(Intent::Unrecognized),
                    None => QuizKind::Choice,
                };
                Intent::RequestPractice {
                    subtopic,
                    practice: PracticeKind::Quiz(kind),
                }
            }
            "game" if !args.is_empty() => {
                let (subtopic, description) = split_first(args);
                Intent::RequestPractice {
                    subtopic,
                    practice: PracticeKind::Game { description },
                }
            }
            _ => Intent::Unrecognized,
        };
        Some(intent)
    }
}

fn split_first(args: &str) -> (String, Option<String>) {
    match args.split_once(char::is_whitespace) {
        Some((first, rest)) if !rest.trim().is_empty() => {
            (first.to_string(), Some(rest.trim().to_string()))
        }
        _ => (args.to_string(), None),
    }
}

/// JSON reply of the classification step.
///
/// A paraphrased `request` on `create_topic` is ignored, the learner's own
/// message becomes the topic title.
#[derive(Debug, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
enum Classification {
    CreateTopic {},
    FetchMaterial {
        subtopic: String,
    },
    RequestQuiz {
        subtopic: String,
        #[serde(default)]
        kind: Option<QuizKind>,
    },
    RequestGame {
        subtopic: String,
        #[serde(default)]
        description: Option<String>,
    },
    ReportProgress {
        subtopic: String,
    },
    Unrecognized,
}

/// Maps free-form messages to an [`Intent`].
///
/// Slash commands are parsed directly; anything else goes through one
/// completion call that must answer with a JSON classification.
pub struct IntentClassifier {
    agent: Agent,
    prompts: Arc<Prompts>,
}

impl IntentClassifier {
    pub fn new(agent: Agent, prompts: Arc<Prompts>) -> Self {
        Self {
            agent: agent.with_tools(&[]),
            prompts,
        }
    }

    /// Classify a message given the current topic outline.
    ///
    /// A reply that cannot be read as a known classification becomes
    /// [`Intent::Unrecognized`]. Completion failures are returned.
    #[instrument(skip(self, outline))]
    pub async fn classify(&self, message: &str, outline: Option<&str>) -> Result<Intent> {
        if let Some(intent) = Intent::parse_command(message) {
            debug!("Parsed command: {:?}", intent);
            return Ok(intent);
        }

        let message = message.trim();
        if message.is_empty() {
            return Ok(Intent::Unrecognized);
        }

        let mut vars = HashMap::new();
        vars.insert("message".to_string(), message.to_string());
        vars.insert(
            "outline".to_string(),
            outline.unwrap_or("(no topic yet)").to_string(),
        );
        let system = self.prompts.render_with_custom(&self.prompts.coordinator.system, &vars);
        let task = self.prompts.render_with_custom(&self.prompts.coordinator.user, &vars);

        let response = self.agent.clone().with_system_prompt(&system).run(&task).await?;

        let classification: Classification = match parse_strict(&response.content) {
            Ok(classification) => classification,
            Err(LearnieError::SchemaViolation(reason)) => {
                warn!("Could not classify message: {}", reason);
                return Ok(Intent::Unrecognized);
            }
            Err(e) => return Err(e),
        };

        let intent = match classification {
            Classification::CreateTopic {} => Intent::CreateTopic {
                request: message.to_string(),
            },
            Classification::FetchMaterial { subtopic } => Intent::FetchMaterial { subtopic },
            Classification::RequestQuiz { subtopic, kind } => Intent::RequestPractice {
                subtopic,
                practice: PracticeKind::Quiz(kind.unwrap_or(QuizKind::Choice)),
            },
            Classification::RequestGame {
                subtopic,
                description,
            } => Intent::RequestPractice {
                subtopic,
                practice: PracticeKind::Game {
                    description: description.filter(|d| !d.trim().is_empty()),
                },
            },
            Classification::ReportProgress { subtopic } => Intent::ReportProgress { subtopic },
            Classification::Unrecognized => Intent::Unrecognized,
        };

        debug!("Classified message as {:?}", intent);
        Ok(intent)
    }
}
