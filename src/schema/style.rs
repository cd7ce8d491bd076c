//! Learner preferences that shape plans, material and quizzes.

use crate::error::{LearnieError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much material a block should cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl MaterialSize {
    pub fn description(&self) -> &'static str {
        match self {
            MaterialSize::Small => "concise content with the essential information, about 1 minute of reading",
            MaterialSize::Medium => "balanced content with good detail, about 5 minutes of reading",
            MaterialSize::Large => "comprehensive content with in-depth explanations, about 10 minutes of reading",
        }
    }
}

/// How material is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialStyle {
    #[default]
    Storytelling,
    BulletPoints,
}

impl MaterialStyle {
    pub fn description(&self) -> &'static str {
        match self {
            MaterialStyle::Storytelling => "narrative approach with flowing explanations",
            MaterialStyle::BulletPoints => "structured lists that are easy to scan",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizDifficulty {
    Basic,
    #[default]
    Medium,
    Advanced,
}

impl QuizDifficulty {
    pub fn description(&self) -> &'static str {
        match self {
            QuizDifficulty::Basic => "fundamental concepts for beginners",
            QuizDifficulty::Medium => "balanced complexity for intermediate learners",
            QuizDifficulty::Advanced => "challenging questions requiring deeper understanding",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl QuizSize {
    pub fn description(&self) -> &'static str {
        match self {
            QuizSize::Small => "a few questions for a quick check",
            QuizSize::Medium => "a balanced set of questions",
            QuizSize::Large => "comprehensive testing with many questions",
        }
    }

    /// Number of questions to ask for, phrased for a prompt.
    pub fn question_count(&self) -> &'static str {
        match self {
            QuizSize::Small => "3",
            QuizSize::Medium => "4 to 5",
            QuizSize::Large => "8 to 10",
        }
    }
}

/// Overall shape of a learning plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningPlanType {
    Explorer,
    Achiever,
    SocialLearner,
}

impl LearningPlanType {
    pub fn description(&self) -> &'static str {
        match self {
            LearningPlanType::Explorer => "a flexible, discovery-based approach that follows the learner's interests",
            LearningPlanType::Achiever => "a goal-oriented, structured approach with clear milestones and measurable outcomes",
            LearningPlanType::SocialLearner => "a collaborative approach built around discussion, peer feedback and group work",
        }
    }
}

/// A learner's preferences, stored with the topic they apply to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LearningStyle {
    pub material_size: MaterialSize,
    pub material_style: MaterialStyle,
    pub quiz_difficulty: QuizDifficulty,
    pub quiz_size: QuizSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<LearningPlanType>,
    /// Free-form description of the plan, used instead of `plan_type`'s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_prompt: Option<String>,
}

impl LearningStyle {
    /// The learning plan approach, if one was chosen.
    pub fn plan_summary(&self) -> Option<String> {
        match (&self.plan_prompt, self.plan_type) {
            (Some(prompt), _) if !prompt.trim().is_empty() => Some(prompt.trim().to_string()),
            (_, Some(plan)) => Some(plan.description().to_string()),
            _ => None,
        }
    }

    /// Preferences as prompt text.
    pub fn describe(&self) -> String {
        let mut lines = vec![
            format!(
                "- Material size: {} ({})",
                self.material_size,
                self.material_size.description()
            ),
            format!(
                "- Material style: {} ({})",
                self.material_style,
                self.material_style.description()
            ),
            format!(
                "- Quiz difficulty: {} ({})",
                self.quiz_difficulty,
                self.quiz_difficulty.description()
            ),
            format!(
                "- Quiz size: {} ({})",
                self.quiz_size,
                self.quiz_size.description()
            ),
        ];
        if let Some(plan) = self.plan_summary() {
            lines.push(format!("- Learning plan: {}", plan));
        }
        lines.join("\n")
    }
}

/// Prompt text for an optional learning style.
pub fn describe_style(style: Option<&LearningStyle>) -> String {
    style
        .map(LearningStyle::describe)
        .unwrap_or_else(|| "No specific preferences.".to_string())
}

fn parse_choice<T: DeserializeOwned>(what: &str, s: &str) -> Result<T> {
    let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| LearnieError::InvalidInput(format!("Unknown {} '{}'", what, s.trim())))
}

fn choice_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => String::new(),
    }
}

macro_rules! style_choice {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&choice_name(self))
            }
        }

        impl FromStr for $ty {
            type Err = LearnieError;

            fn from_str(s: &str) -> Result<Self> {
                parse_choice($what, s)
            }
        }
    };
}

style_choice!(MaterialSize, "material size");
style_choice!(MaterialStyle, "material style");
style_choice!(QuizDifficulty, "quiz difficulty");
style_choice!(QuizSize, "quiz size");
style_choice!(LearningPlanType, "learning plan type");
