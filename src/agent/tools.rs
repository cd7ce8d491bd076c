//! Tool definitions and implementations for the agent system.

use crate::completion::ToolSpec;
use crate::error::{LearnieError, Result};
use crate::image_search::ImageSearch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const SEARCH_IMAGES: &str = "search_images";
pub const GET_GAMEPLAY_IDEAS: &str = "get_gameplay_ideas";

/// Tools an agent may be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SearchImages,
    GetGameplayIdeas,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::SearchImages => SEARCH_IMAGES,
            ToolKind::GetGameplayIdeas => GET_GAMEPLAY_IDEAS,
        }
    }

    /// Function definition advertised to the model.
    pub fn spec(&self) -> ToolSpec {
        match self {
            ToolKind::SearchImages => ToolSpec {
                name: SEARCH_IMAGES.to_string(),
                description: "Find one illustration for a query. Returns {\"url\": string}; \
                    the url is empty when nothing matched. Use the returned url verbatim."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "A concrete description of the image to find"
                        }
                    },
                    "required": ["query"]
                }),
            },
            ToolKind::GetGameplayIdeas => ToolSpec {
                name: GET_GAMEPLAY_IDEAS.to_string(),
                description: "List gameplay ideas to use as inspiration for a learning game."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            },
        }
    }
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Look up an illustration.
    SearchImages { query: String },
    /// Fetch the gameplay idea pool.
    GetGameplayIdeas,
}

/// Result of executing a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text sent back to the model.
    pub content: String,
    /// Image URL produced by an image lookup, when non-empty.
    pub image_url: Option<String>,
}

impl ToolOutput {
    fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            image_url: None,
        }
    }
}

/// Tool execution context with access to external providers.
pub struct ToolContext {
    pub image_search: Arc<dyn ImageSearch>,
    pub gameplay_ideas: Vec<String>,
}

impl ToolContext {
    pub fn new(image_search: Arc<dyn ImageSearch>) -> Self {
        Self {
            image_search,
            gameplay_ideas: Vec::new(),
        }
    }

    pub fn with_gameplay_ideas(mut self, ideas: Vec<String>) -> Self {
        self.gameplay_ideas = ideas;
        self
    }

    /// Execute a tool call.
    ///
    /// A missing image search credential is returned as an error; every other
    /// provider problem is reported to the model as an empty result.
    pub async fn execute(&self, tool: &ToolCall) -> Result<ToolOutput> {
        match tool {
            ToolCall::SearchImages { query } => self.execute_search_images(query).await,
            ToolCall::GetGameplayIdeas => self.execute_get_gameplay_ideas(),
        }
    }

    async fn execute_search_images(&self, query: &str) -> Result<ToolOutput> {
        let url = match self.image_search.lookup(query).await? {
            Some(result) => result.url,
            None => {
                debug!("Image provider unavailable for '{}', returning empty url", query);
                String::new()
            }
        };

        let content = serde_json::json!({ "url": url }).to_string();
        Ok(ToolOutput {
            content,
            image_url: (!url.is_empty()).then_some(url),
        })
    }

    fn execute_get_gameplay_ideas(&self) -> Result<ToolOutput> {
        Ok(ToolOutput::text(serde_json::to_string(&self.gameplay_ideas)?))
    }
}

/// Get function definitions for the given tools.
pub fn tool_definitions(tools: &[ToolKind]) -> Vec<ToolSpec> {
    tools.iter().map(ToolKind::spec).collect()
}

/// Parse a tool call from the model's name and JSON arguments.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = if arguments.trim().is_empty() {
        serde_json::Value::Object(Default::default())
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| LearnieError::Agent(format!("Invalid tool arguments: {}", e)))?
    };

    match name {
        SEARCH_IMAGES => {
            let query = args["query"]
                .as_str()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .ok_or_else(|| LearnieError::Agent("Missing 'query' argument".to_string()))?
                .to_string();
            Ok(ToolCall::SearchImages { query })
        }
        GET_GAMEPLAY_IDEAS => Ok(ToolCall::GetGameplayIdeas),
        _ => Err(LearnieError::Agent(format!("Unknown tool: {}", name))),
    }
}
