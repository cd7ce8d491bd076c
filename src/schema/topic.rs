//! Topic / Section / Subtopic hierarchy.

use super::{check_image_url, null_as_empty, LearningStyle};
use crate::error::{LearnieError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const MIN_SECTIONS: usize = 3;
pub const MAX_SECTIONS: usize = 10;
pub const MIN_SUBTOPICS: usize = 3;
pub const MAX_SUBTOPICS: usize = 10;
pub const MAX_SUMMARY_CHARS: usize = 500;
pub const MAX_CLARIFICATIONS: usize = 3;
pub const SUGGESTION_COUNT: usize = 3;

/// A learning plan: the learner's request broken into ordered sections.
///
/// Sections and subtopics are ordered from foundational to advanced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// The learner's original request, verbatim.
    pub title: String,
    /// Broad subject category (e.g. "Mathematics").
    pub subject: String,
    pub sections: Vec<Section>,
    /// Preferences the plan was made for. Also applied to its material and quizzes.
    #[serde(
        default,
        rename = "learningStyle",
        skip_serializing_if = "Option::is_none"
    )]
    pub learning_style: Option<LearningStyle>,
}

/// A group of related subtopics with a preview image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    /// Looked-up preview image, empty when no image could be found.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    pub subtopics: Vec<Subtopic>,
}

/// A single concept, technique or skill to learn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtopic {
    pub title: String,
    /// Short brief used as generation input for materials. Not shown to learners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Subtopic {
    /// Check the title and the summary length.
    pub fn validate(&self, location: &str) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LearnieError::violation(format!("{}: title is empty", location)));
        }
        if let Some(summary) = &self.summary {
            let chars = summary.chars().count();
            if chars > MAX_SUMMARY_CHARS {
                return Err(LearnieError::violation(format!(
                    "{}: summary has {} characters (max {})",
                    location, chars, MAX_SUMMARY_CHARS
                )));
            }
        }
        Ok(())
    }
}

/// A question asked before planning to narrow down what the learner wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl Clarification {
    pub fn answered(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: Some(answer.into()),
        }
    }
}

/// Question and answer pairs as prompt text.
pub fn describe_clarifications(clarifications: &[Clarification]) -> String {
    if clarifications.is_empty() {
        return "(none)".to_string();
    }
    clarifications
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "Q{}: {}\nA{}: {}",
                i + 1,
                c.question,
                i + 1,
                c.answer.as_deref().unwrap_or("(no answer)")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A proposed subtopic the learner can choose to add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtopicSuggestion {
    pub title: String,
    pub description: String,
}

/// Position of a subtopic inside a topic, 1-based, written as `"2.3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SubtopicId {
    pub section: usize,
    pub subtopic: usize,
}

impl SubtopicId {
    pub fn new(section: usize, subtopic: usize) -> Self {
        Self { section, subtopic }
    }
}

impl fmt::Display for SubtopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.subtopic)
    }
}

impl FromStr for SubtopicId {
    type Err = LearnieError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LearnieError::InvalidInput(format!("Invalid subtopic id: {}", s));
        let (section, subtopic) = s.trim().split_once('.').ok_or_else(invalid)?;
        let section: usize = section.parse().map_err(|_| invalid())?;
        let subtopic: usize = subtopic.parse().map_err(|_| invalid())?;
        if section == 0 || subtopic == 0 {
            return Err(invalid());
        }
        Ok(Self { section, subtopic })
    }
}

impl From<SubtopicId> for String {
    fn from(id: SubtopicId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SubtopicId {
    type Error = LearnieError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Topic {
    /// Check structural bounds and field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LearnieError::violation("topic title is empty"));
        }
        if self.subject.trim().is_empty() {
            return Err(LearnieError::violation("topic subject is empty"));
        }

        let count = self.sections.len();
        if !(MIN_SECTIONS..=MAX_SECTIONS).contains(&count) {
            return Err(LearnieError::violation(format!(
                "topic must have {}-{} sections, got {}",
                MIN_SECTIONS, MAX_SECTIONS, count
            )));
        }

        for (i, section) in self.sections.iter().enumerate() {
            let location = format!("section {}", i + 1);
            if section.title.trim().is_empty() {
                return Err(LearnieError::violation(format!("{}: title is empty", location)));
            }
            check_image_url(&section.image_url, &location)?;

            let count = section.subtopics.len();
            if !(MIN_SUBTOPICS..=MAX_SUBTOPICS).contains(&count) {
                return Err(LearnieError::violation(format!(
                    "{} ('{}') must have {}-{} subtopics, got {}",
                    location, section.title, MIN_SUBTOPICS, MAX_SUBTOPICS, count
                )));
            }

            for (j, subtopic) in section.subtopics.iter().enumerate() {
                subtopic.validate(&format!("subtopic {}.{}", i + 1, j + 1))?;
            }
        }

        Ok(())
    }

    /// Reject section images that were not returned by an image lookup.
    pub fn ensure_images_from(&self, looked_up: &HashSet<String>) -> Result<()> {
        for (i, section) in self.sections.iter().enumerate() {
            if !section.image_url.is_empty() && !looked_up.contains(&section.image_url) {
                return Err(LearnieError::violation(format!(
                    "section {} ('{}') uses image URL '{}' that was not returned by search_images",
                    i + 1,
                    section.title,
                    section.image_url
                )));
            }
        }
        Ok(())
    }

    /// Iterate over every subtopic with its id and parent section.
    pub fn subtopics(&self) -> impl Iterator<Item = (SubtopicId, &Section, &Subtopic)> {
        self.sections.iter().enumerate().flat_map(|(i, section)| {
            section
                .subtopics
                .iter()
                .enumerate()
                .map(move |(j, subtopic)| (SubtopicId::new(i + 1, j + 1), section, subtopic))
        })
    }

    pub fn section(&self, id: SubtopicId) -> Option<&Section> {
        self.sections.get(id.section.checked_sub(1)?)
    }

    pub fn subtopic(&self, id: SubtopicId) -> Option<&Subtopic> {
        self.section(id)?.subtopics.get(id.subtopic.checked_sub(1)?)
    }

    /// Resolve a learner's reference to a subtopic.
    ///
    /// Accepts an id (`"2.3"`), then an exact title (case-insensitive), then a
    /// title containing the reference.
    pub fn resolve_subtopic(&self, reference: &str) -> Option<SubtopicId> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        if let Ok(id) = reference.parse::<SubtopicId>() {
            return self.subtopic(id).map(|_| id);
        }

        let needle = reference.to_lowercase();
        self.subtopics()
            .find(|(_, _, s)| s.title.to_lowercase() == needle)
            .or_else(|| {
                self.subtopics()
                    .find(|(_, _, s)| s.title.to_lowercase().contains(&needle))
            })
            .map(|(id, _, _)| id)
    }

    /// Whether any subtopic already has this title, ignoring case.
    pub fn has_subtopic_titled(&self, title: &str) -> bool {
        let needle = title.trim().to_lowercase();
        self.subtopics()
            .any(|(_, _, s)| s.title.trim().to_lowercase() == needle)
    }

    /// Append a subtopic to the end of a section (1-based) and return its id.
    ///
    /// Existing ids stay stable. Full sections are refused.
    pub fn add_subtopic(&mut self, section: usize, subtopic: Subtopic) -> Result<SubtopicId> {
        let index = section
            .checked_sub(1)
            .filter(|i| *i < self.sections.len())
            .ok_or_else(|| LearnieError::SubtopicNotFound(format!("section {}", section)))?;
        let id = SubtopicId::new(section, self.sections[index].subtopics.len() + 1);
        subtopic.validate(&format!("subtopic {}", id))?;

        let target = &mut self.sections[index];
        if target.subtopics.len() >= MAX_SUBTOPICS {
            return Err(LearnieError::InvalidInput(format!(
                "Section {} ('{}') already has {} subtopics",
                section, target.title, MAX_SUBTOPICS
            )));
        }
        target.subtopics.push(subtopic);
        Ok(id)
    }

    /// Outline including subtopic summaries.
    pub fn detailed_outline(&self) -> String {
        let mut result = format!("Topic: {} (Subject: {})\n", self.title, self.subject);
        for (id, section, subtopic) in self.subtopics() {
            if id.subtopic == 1 {
                result.push_str(&format!("\nSection {}: {}\n", id.section, section.title));
            }
            match &subtopic.summary {
                Some(summary) => {
                    result.push_str(&format!("  - {} {}: {}\n", id, subtopic.title, summary))
                }
                None => result.push_str(&format!("  - {} {}\n", id, subtopic.title)),
            }
        }
        result
    }

    /// Plain-text outline used as context in prompts.
    pub fn outline(&self) -> String {
        let mut result = format!("Topic: {} (Subject: {})\n", self.title, self.subject);
        for (i, section) in self.sections.iter().enumerate() {
            result.push_str(&format!("\nSection {}: {}\n", i + 1, section.title));
            for (j, subtopic) in section.subtopics.iter().enumerate() {
                result.push_str(&format!("  - {}.{} {}\n", i + 1, j + 1, subtopic.title));
            }
        }
        result
    }
}
