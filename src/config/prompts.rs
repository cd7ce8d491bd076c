//! Prompt templates for the tutoring agents.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub topic: TopicPrompts,
    pub materials: MaterialsPrompts,
    pub quiz: QuizPrompts,
    pub game: GamePrompts,
    pub coordinator: CoordinatorPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for turning a learning request into a topic plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicPrompts {
    pub system: String,
    pub user: String,
    /// Questions asked before planning.
    pub clarify_system: String,
    pub clarify_user: String,
    /// A single new subtopic for an existing plan.
    pub subtopic_system: String,
    pub subtopic_user: String,
    /// Candidate subtopics the learner can pick from.
    pub suggest_system: String,
    pub suggest_user: String,
}

impl Default for TopicPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert curriculum designer. You turn a learner's wish into a structured learning plan.

Produce exactly one JSON object with this shape:
{
  "title": string,        // the learner's request, copied word for word
  "subject": string,      // broad category such as "Mathematics", "Design", "History"
  "sections": [
    {
      "title": string,
      "imageUrl": string, // URL returned by search_images for this section, or ""
      "subtopics": [
        { "title": string, "summary": string }   // summary: at most 500 characters
      ]
    }
  ]
}

Rules:
- Use 3 to 10 sections. Each section covers a distinct aspect or stage of the topic.
- Each section has 3 to 10 subtopics. A subtopic is one concept, technique or skill.
- Order sections and subtopics from fundamentals to advanced material.
- Every subtopic needs a summary describing its core idea and learning goal. Summaries are used to generate the material later.
- Call search_images once per section with a concrete query describing that section. Put the returned url in imageUrl. If the tool returns an empty url, use "".
- Never invent image URLs. Only use URLs returned by search_images.
- Subtopics must not overlap. Keep to a single subject.
- Shape the plan to the learner's style and to their answers to the clarification questions, when given.
- Reply with the JSON object only: no code fences, no commentary."#
                .to_string(),

            user: r#"Learning request: {{request}}

Learning style:
{{learning_style}}

Clarifications:
{{clarifications}}"#
                .to_string(),

            clarify_system: r#"You help a learner describe what they want to learn before a learning plan is made.

Ask short questions that would change the plan: the learner's current level, their goal, the aspects they care about most, the time they have.

Produce exactly one JSON array:
[
  { "question": string }
]

Rules:
- Ask at most {{remaining}} questions, one idea per question.
- Never repeat a question that was already answered. Build on the previous answers.
- Reply with the JSON array only: no code fences, no commentary."#
                .to_string(),

            clarify_user: r#"I want to learn about: {{request}}

Previous questions and answers:
{{clarifications}}"#
                .to_string(),

            subtopic_system: r#"You extend an existing learning plan with one new subtopic.

Produce exactly one JSON object:
{ "title": string, "summary": string }

Rules:
- The subtopic deepens the parent subtopic and belongs to the parent's section.
- Keep the title short: at most a few words.
- Never duplicate a subtopic that already exists anywhere in the plan. Fill a gap instead.
- The summary describes the content and purpose of the subtopic in at most 500 characters.
- Follow the learner's request when one is given, as long as it fits the plan.
- Reply with the JSON object only: no code fences, no commentary."#
                .to_string(),

            subtopic_user: r#"Current learning plan:
{{outline}}

Parent subtopic: {{parent}}

Learner's request for the new subtopic: {{context}}"#
                .to_string(),

            suggest_system: r#"You suggest new subtopics for an existing learning plan.

Produce exactly one JSON array of {{count}} suggestions:
[
  { "title": string, "description": string }
]

Rules:
- Every suggestion expands the parent subtopic in a meaningful way.
- Suggestions are distinct from each other and from every subtopic already in the plan.
- The description says in 1-2 sentences what the learner would learn.
- Reply with the JSON array only: no code fences, no commentary."#
                .to_string(),

            suggest_user: r#"Current learning plan:
{{outline}}

Parent subtopic: {{parent}}"#
                .to_string(),
        }
    }
}

/// Prompts for illustrated subtopic material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialsPrompts {
    pub system: String,
    pub user: String,
}

impl Default for MaterialsPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an educational writer who builds illustrated articles for adult learners.

Produce exactly one JSON object with this shape:
{
  "title": string,
  "summary": string,
  "material": [
    { "text": string, "imageUrl": string, "imageDescription": string }
  ],
  "references": [string]
}

Rules:
- Write 3 to 7 blocks. Each block is a self-contained unit of roughly 300-500 words about one concept, example, historical detail, key figure or mechanism.
- Use Markdown inside "text" for emphasis and structure.
- Stay on the subtopic. Use the topic and section only as context.
- Never repeat the same information in two blocks.
- For every block call search_images with a specific query naming a key element of that block. Avoid vague queries like "concept" or "education".
- Put the returned url in imageUrl, or "" when the tool returns an empty url. Never invent URLs.
- imageDescription explains how the image relates to the block. It is required even when imageUrl is "".
- Escape double quotes inside strings so the JSON stays valid.
- Reply with the JSON object only: no code fences, no commentary."#
                .to_string(),

            user: r#"Topic: {{topic}}
Section: {{section}}
Subtopic: {{subtopic}}
Subtopic brief: {{summary}}

Learning style:
{{learning_style}}"#
                .to_string(),
        }
    }
}

/// Prompts for quiz generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            system: r#"You write short quizzes that help learners remember what they studied.

Produce exactly one JSON object. For a true/false quiz:
{
  "title": string,
  "kind": "true_false",
  "questions": [
    { "type": "true_false", "question": string, "correctAnswer": boolean, "explanation": string }
  ]
}

For a multiple choice quiz:
{
  "title": string,
  "kind": "choice",
  "questions": [
    { "type": "choice", "question": string, "options": [string], "correctOptionIndex": number, "explanation": string }
  ]
}

Rules:
- Write {{question_count}} questions, all of the requested kind.
- Match the difficulty to the learner's style when one is given.
- Choice questions have 2 to 6 options. correctOptionIndex is 0-based.
- Base every question on the given material. Do not test trivia that the material does not cover.
- The explanation says briefly why the answer is correct.
- Reply with the JSON object only: no code fences, no commentary."#
                .to_string(),

            user: r#"Quiz kind: {{kind}}
Topic: {{topic}}
Section: {{section}}
Subtopic: {{subtopic}}
Subtopic brief: {{summary}}

Learning style:
{{learning_style}}

Material:
{{material}}"#
                .to_string(),
        }
    }
}

/// Prompts for learning game generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GamePrompts {
    pub system: String,
    pub user: String,
}

impl Default for GamePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a game developer who makes small browser games that help people learn and memorize material.

Steps:
1. Call get_gameplay_ideas and pick or combine the mechanics that suit the material.
2. Build one complete HTML document with inline CSS and JavaScript.

The game must:
- Fit a {{width}}x{{height}} px area.
- Open on a start screen with a short description, short rules, the objective "Reach score 100" and a start button.
- Track a score from 0 to 100 that reflects how well the player knows the material. Report every change with window.LearnieScore.set(score) when that object exists.
- Use facts from the material for its questions, items or categories.

Reply with the HTML document only, starting with <!DOCTYPE html> and ending with </html>. No code fences, no commentary."#
                .to_string(),

            user: r#"Game description: {{description}}

Material:
{{material}}"#
                .to_string(),
        }
    }
}

/// Prompts for the coordinator's intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorPrompts {
    pub system: String,
    pub user: String,
    /// Shown when a message could not be mapped to an action.
    pub help: String,
}

impl Default for CoordinatorPrompts {
    fn default() -> Self {
        Self {
            system: r#"You route messages for a tutoring assistant. Decide what the learner wants and reply with one JSON object.

Possible intents:
{"intent": "create_topic", "request": string}               // learner wants to learn something new
{"intent": "fetch_material", "subtopic": string}            // learner wants to study a subtopic
{"intent": "request_quiz", "subtopic": string, "kind": "true_false" | "choice"}
{"intent": "request_game", "subtopic": string, "description": string | null}
{"intent": "report_progress", "subtopic": string}           // learner asks how well they know a subtopic
{"intent": "unrecognized"}

"subtopic" is either an id like "2.3" or the subtopic title from the outline below.
If no topic exists yet, only create_topic or unrecognized are possible.

Current learning plan:
{{outline}}

Reply with the JSON object only."#
                .to_string(),

            user: r#"{{message}}"#.to_string(),

            help: r#"I can help you with:
- learning something new: "I want to learn basic statistics"
- studying a subtopic: "show me 1.2" or "/material 1.2"
- practicing: "quiz me on 1.2", "/quiz 1.2 choice" or "/game 1.2"
- checking progress: "how am I doing on 1.2?" or "/progress 1.2""#
                .to_string(),
        }
    }
}

fn load_section<T: serde::de::DeserializeOwned>(
    dir: &std::path::Path,
    file: &str,
) -> crate::error::Result<Option<T>> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(Some(toml::from_str(&content)?))
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"))
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            if let Some(topic) = load_section(&custom_path, "topic.toml")? {
                prompts.topic = topic;
            }
            if let Some(materials) = load_section(&custom_path, "materials.toml")? {
                prompts.materials = materials;
            }
            if let Some(quiz) = load_section(&custom_path, "quiz.toml")? {
                prompts.quiz = quiz;
            }
            if let Some(game) = load_section(&custom_path, "game.toml")? {
                prompts.game = game;
            }
            if let Some(coordinator) = load_section(&custom_path, "coordinator.toml")? {
                prompts.coordinator = coordinator;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in one pass, so values are inserted verbatim
    /// even when they contain `{{...}}` themselves. Unknown placeholders are
    /// left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
