//! Quizzes and quiz grading.

use crate::error::{LearnieError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_QUESTIONS: usize = 3;
pub const MAX_QUESTIONS: usize = 10;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

/// The two supported question styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    TrueFalse,
    Choice,
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizKind::TrueFalse => write!(f, "true_false"),
            QuizKind::Choice => write!(f, "choice"),
        }
    }
}

impl FromStr for QuizKind {
    type Err = LearnieError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "true_false" | "truefalse" | "tf" => Ok(QuizKind::TrueFalse),
            "choice" | "multiple_choice" | "mc" => Ok(QuizKind::Choice),
            other => Err(LearnieError::InvalidInput(format!(
                "Unknown quiz kind '{}'. Use 'true_false' or 'choice'",
                other
            ))),
        }
    }
}

/// A generated quiz over one subtopic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    pub kind: QuizKind,
    pub questions: Vec<QuizQuestion>,
}

/// A single quiz question, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuizQuestion {
    #[serde(rename = "true_false")]
    TrueFalse {
        question: String,
        #[serde(rename = "correctAnswer")]
        correct_answer: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    #[serde(rename = "choice")]
    Choice {
        question: String,
        options: Vec<String>,
        #[serde(rename = "correctOptionIndex")]
        correct_option_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
}

impl QuizQuestion {
    pub fn kind(&self) -> QuizKind {
        match self {
            QuizQuestion::TrueFalse { .. } => QuizKind::TrueFalse,
            QuizQuestion::Choice { .. } => QuizKind::Choice,
        }
    }

    pub fn question(&self) -> &str {
        match self {
            QuizQuestion::TrueFalse { question, .. } | QuizQuestion::Choice { question, .. } => {
                question
            }
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        match self {
            QuizQuestion::TrueFalse { explanation, .. }
            | QuizQuestion::Choice { explanation, .. } => explanation.as_deref(),
        }
    }

    pub fn correct_answer(&self) -> QuizAnswer {
        match self {
            QuizQuestion::TrueFalse { correct_answer, .. } => QuizAnswer::TrueFalse(*correct_answer),
            QuizQuestion::Choice {
                correct_option_index,
                ..
            } => QuizAnswer::Choice(*correct_option_index),
        }
    }
}

/// A learner's answer to one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizAnswer {
    TrueFalse(bool),
    Choice(usize),
}

impl fmt::Display for QuizAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizAnswer::TrueFalse(value) => write!(f, "{}", value),
            QuizAnswer::Choice(index) => write!(f, "option {}", index + 1),
        }
    }
}

/// Per-question grading outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question: String,
    pub user_answer: QuizAnswer,
    pub correct_answer: QuizAnswer,
    pub is_correct: bool,
}

/// Graded quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub title: String,
    pub questions: Vec<QuestionResult>,
    pub correct: usize,
    pub total: usize,
    /// Percentage of correct answers, 0-100.
    pub score: u8,
    pub passed: bool,
}

impl Quiz {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LearnieError::violation("quiz title is empty"));
        }

        let count = self.questions.len();
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
            return Err(LearnieError::violation(format!(
                "quiz must have {}-{} questions, got {}",
                MIN_QUESTIONS, MAX_QUESTIONS, count
            )));
        }

        for (i, question) in self.questions.iter().enumerate() {
            let n = i + 1;
            if question.question().trim().is_empty() {
                return Err(LearnieError::violation(format!("question {}: text is empty", n)));
            }
            if question.kind() != self.kind {
                return Err(LearnieError::violation(format!(
                    "question {} is {} but the quiz is {}",
                    n,
                    question.kind(),
                    self.kind
                )));
            }
            if let QuizQuestion::Choice {
                options,
                correct_option_index,
                ..
            } = question
            {
                if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
                    return Err(LearnieError::violation(format!(
                        "question {} must have {}-{} options, got {}",
                        n,
                        MIN_OPTIONS,
                        MAX_OPTIONS,
                        options.len()
                    )));
                }
                if options.iter().any(|o| o.trim().is_empty()) {
                    return Err(LearnieError::violation(format!(
                        "question {} has an empty option",
                        n
                    )));
                }
                if *correct_option_index >= options.len() {
                    return Err(LearnieError::violation(format!(
                        "question {}: correctOptionIndex {} is out of range",
                        n, correct_option_index
                    )));
                }
            }
        }

        Ok(())
    }

    /// Grade a full set of answers, in question order.
    ///
    /// `pass_mark` is the minimum percentage for `passed`.
    pub fn grade(&self, answers: &[QuizAnswer], pass_mark: u8) -> Result<QuizResult> {
        if answers.len() != self.questions.len() {
            return Err(LearnieError::InvalidInput(format!(
                "Expected {} answers, got {}",
                self.questions.len(),
                answers.len()
            )));
        }

        let mut questions = Vec::with_capacity(answers.len());
        for (i, (question, answer)) in self.questions.iter().zip(answers).enumerate() {
            let answer = match (question, *answer) {
                (QuizQuestion::TrueFalse { .. }, QuizAnswer::TrueFalse(_)) => *answer,
                (QuizQuestion::Choice { options, .. }, QuizAnswer::Choice(index))
                    if index < options.len() =>
                {
                    *answer
                }
                _ => {
                    return Err(LearnieError::InvalidInput(format!(
                        "Answer {} ({}) does not fit a {} question",
                        i + 1,
                        answer,
                        question.kind()
                    )))
                }
            };
            let correct_answer = question.correct_answer();
            questions.push(QuestionResult {
                question: question.question().to_string(),
                user_answer: answer,
                correct_answer,
                is_correct: answer == correct_answer,
            });
        }

        let correct = questions.iter().filter(|q| q.is_correct).count();
        let total = questions.len();
        let score = if total == 0 {
            0
        } else {
            ((correct as f64 / total as f64) * 100.0).round() as u8
        };

        Ok(QuizResult {
            title: self.title.clone(),
            questions,
            correct,
            total,
            score,
            passed: score >= pass_mark,
        })
    }
}
