//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use learnie::completion::{CompletionReply, CompletionRequest, CompletionService, ToolInvocation};
use learnie::config::{Prompts, Settings};
use learnie::image_search::{ImageResult, ImageSearch};
use learnie::tutor::AgentFactory;
use learnie::{LearnieError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Completion service that plays back a fixed list of replies.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<CompletionReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<CompletionReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, replies: Vec<CompletionReply>) {
        self.replies.lock().unwrap().extend(replies);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LearnieError::Completion("no scripted reply left".to_string()))
    }
}

/// Image search returning `https://img.test/{n}.jpg` for the n-th lookup.
#[derive(Default)]
pub struct StaticImageSearch {
    lookups: AtomicUsize,
}

impl StaticImageSearch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSearch for StaticImageSearch {
    async fn lookup(&self, _query: &str) -> Result<Option<ImageResult>> {
        let n = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(ImageResult::new(image_url(n))))
    }

    fn name(&self) -> &str {
        "static"
    }
}

pub fn image_url(n: usize) -> String {
    format!("https://img.test/{}.jpg", n)
}

pub fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.generation.max_retries = 2;
    settings
}

pub fn factory(completion: Arc<dyn CompletionService>, search: Arc<dyn ImageSearch>) -> AgentFactory {
    AgentFactory::new(completion, search, settings(), Prompts::default())
}

/// A reply requesting `count` image lookups.
pub fn lookups(count: usize) -> CompletionReply {
    CompletionReply::tool_calls(
        (1..=count)
            .map(|i| {
                ToolInvocation::new(
                    format!("call_{}", i),
                    "search_images",
                    format!(r#"{{"query": "illustration {}"}}"#, i),
                )
            })
            .collect(),
    )
}

pub fn gameplay_ideas_call() -> CompletionReply {
    CompletionReply::tool_calls(vec![ToolInvocation::new(
        "call_ideas",
        "get_gameplay_ideas",
        "{}",
    )])
}

/// A statistics plan with three sections of three subtopics.
pub fn topic_json(section_images: [&str; 3]) -> String {
    serde_json::json!({
        "title": "Statistics Basics",
        "subject": "Mathematics",
        "sections": [
            {
                "title": "Describing Data",
                "imageUrl": section_images[0],
                "subtopics": [
                    {"title": "Mean and Median", "summary": "Two ways to describe the center of a dataset."},
                    {"title": "Spread and Variance", "summary": "How far values sit from the center."},
                    {"title": "Charts and Histograms", "summary": "Seeing the shape of data."}
                ]
            },
            {
                "title": "Probability",
                "imageUrl": section_images[1],
                "subtopics": [
                    {"title": "Events and Outcomes"},
                    {"title": "Conditional Probability"},
                    {"title": "Independence"}
                ]
            },
            {
                "title": "Inference",
                "imageUrl": section_images[2],
                "subtopics": [
                    {"title": "Sampling"},
                    {"title": "Confidence Intervals"},
                    {"title": "Hypothesis Tests"}
                ]
            }
        ]
    })
    .to_string()
}

/// An article with three blocks on distinct ideas.
pub fn material_json(block_images: [&str; 3]) -> String {
    serde_json::json!({
        "title": "Mean and Median",
        "summary": "Two measures of the center of a dataset.",
        "material": [
            {
                "text": "The **mean** adds every value and divides the total by the count of values. Averages react strongly to extreme values, so one enormous salary raises the average salary of everyone.",
                "imageUrl": block_images[0],
                "imageDescription": "A balance beam with weights placed along it"
            },
            {
                "text": "The **median** sorts observations and picks the middle observation. Sorting ignores magnitude, so outliers barely move the middle observation of a sorted list.",
                "imageUrl": block_images[1],
                "imageDescription": "A row of people ordered by height"
            },
            {
                "text": "Choosing between them depends on skewed distributions. Income distributions are skewed, which is why reports about household income usually quote the median household income.",
                "imageUrl": block_images[2],
                "imageDescription": "A histogram with a long right tail"
            }
        ],
        "references": ["https://en.wikipedia.org/wiki/Median", "https://en.wikipedia.org/wiki/Median"]
    })
    .to_string()
}

/// A choice quiz whose correct answers are options 1, 2 and 3.
pub fn choice_quiz_json() -> String {
    serde_json::json!({
        "title": "Mean and Median",
        "kind": "choice",
        "questions": [
            {
                "type": "choice",
                "question": "What is the mean of 2, 4 and 6?",
                "options": ["4", "6", "12"],
                "correctOptionIndex": 0,
                "explanation": "2 + 4 + 6 = 12, and 12 / 3 = 4."
            },
            {
                "type": "choice",
                "question": "Which measure is least affected by outliers?",
                "options": ["Mean", "Median", "Range"],
                "correctOptionIndex": 1
            },
            {
                "type": "choice",
                "question": "What is the median of 1, 3 and 100?",
                "options": ["1", "34.7", "3"],
                "correctOptionIndex": 2
            }
        ]
    })
    .to_string()
}

pub fn game_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Falling Words</title></head>
<body>
<canvas width="700" height="800"></canvas>
<button id="start">Start</button>
<p>Catch the right terms to reach 100 points!</p>
</body>
</html>"#
        .to_string()
}
