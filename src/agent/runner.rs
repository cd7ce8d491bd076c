//! Agent runner with tool calling loop.

use super::tools::{parse_tool_call, tool_definitions, ToolContext, ToolKind};
use crate::completion::{ChatMessage, CompletionRequest, CompletionService, ToolInvocation};
use crate::error::{LearnieError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_MAX_ITERATIONS: usize = 15;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 300;

/// An LLM agent with a fixed role prompt and toolset.
#[derive(Clone)]
pub struct Agent {
    name: String,
    completion: Arc<dyn CompletionService>,
    model: String,
    tools: Arc<ToolContext>,
    toolset: Vec<ToolKind>,
    system_prompt: String,
    max_iterations: usize,
    temperature: Option<f32>,
    call_timeout: Duration,
}

impl Agent {
    /// Create a new agent without tools.
    pub fn new(
        name: &str,
        completion: Arc<dyn CompletionService>,
        tools: Arc<ToolContext>,
        model: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            completion,
            model: model.to_string(),
            tools,
            toolset: Vec::new(),
            system_prompt: String::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: None,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Tools the model may call.
    pub fn with_tools(mut self, toolset: &[ToolKind]) -> Self {
        self.toolset = toolset.to_vec();
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Timeout for each completion call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run the agent on a task until it answers without tool calls.
    pub async fn run(&self, task: &str) -> Result<AgentResponse> {
        let mut messages = Vec::with_capacity(4);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage::system(self.system_prompt.clone()));
        }
        messages.push(ChatMessage::user(task));

        let tools = tool_definitions(&self.toolset);
        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(LearnieError::Agent(format!(
                    "{} exceeded maximum iterations ({})",
                    self.name, self.max_iterations
                )));
            }

            debug!("{} iteration {}", self.name, iterations);

            let request = CompletionRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                temperature: self.temperature,
            };

            let reply = tokio::time::timeout(self.call_timeout, self.completion.complete(request))
                .await
                .map_err(|_| LearnieError::Timeout(self.call_timeout.as_secs()))??;

            if !reply.has_tool_calls() {
                let content = reply.content.unwrap_or_default();
                debug!(
                    "{} final response: {}",
                    self.name,
                    content.chars().take(500).collect::<String>()
                );
                return Ok(AgentResponse {
                    content,
                    tool_calls: tool_calls_made,
                    iterations,
                });
            }

            messages.push(ChatMessage::assistant_tool_calls(reply.tool_calls.clone()));

            for invocation in &reply.tool_calls {
                let record = self.execute_tool_call(invocation).await?;
                messages.push(ChatMessage::tool_result(&invocation.id, record.result.clone()));
                tool_calls_made.push(record);
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    ///
    /// Bad arguments and unknown tools are reported back to the model.
    /// Configuration errors abort the run.
    async fn execute_tool_call(&self, invocation: &ToolInvocation) -> Result<ToolCallRecord> {
        let name = &invocation.name;
        let arguments = &invocation.arguments;

        info!("{} calling tool: {} with args: {}", self.name, name, arguments);

        let (result, image_url) = match parse_tool_call(name, arguments) {
            Ok(tool) if self.toolset.iter().any(|t| t.name() == name) => {
                match self.tools.execute(&tool).await {
                    Ok(output) => (output.content, output.image_url),
                    Err(e @ LearnieError::Config(_)) => return Err(e),
                    Err(e) => {
                        warn!("Tool {} failed: {}", name, e);
                        (format!("Tool error: {}", e), None)
                    }
                }
            }
            Ok(_) => (format!("Tool '{}' is not available to this agent", name), None),
            Err(e) => (format!("Failed to parse tool call: {}", e), None),
        };

        Ok(ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
            image_url,
        })
    }
}

/// Response from an agent run.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

impl AgentResponse {
    /// Image URLs returned by lookups during this run.
    pub fn looked_up_images(&self) -> HashSet<String> {
        self.tool_calls
            .iter()
            .filter_map(|r| r.image_url.clone())
            .collect()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.tool_calls.iter().filter(|r| r.name == name).count()
    }

    pub fn called(&self, name: &str) -> bool {
        self.count_calls(name) > 0
    }
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned to the model.
    pub result: String,
    /// Image produced by the call, if any.
    pub image_url: Option<String>,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionReply;
    use crate::image_search::{ImageResult, ImageSearch};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted(Mutex<VecDeque<CompletionReply>>);

    #[async_trait]
    impl CompletionService for Scripted {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionReply> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LearnieError::Completion("script exhausted".to_string()))
        }
    }

    struct Numbered;

    #[async_trait]
    impl ImageSearch for Numbered {
        async fn lookup(&self, query: &str) -> Result<Option<ImageResult>> {
            Ok(Some(ImageResult::new(format!("https://img.test/{}.jpg", query))))
        }

        fn name(&self) -> &str {
            "numbered"
        }
    }

    fn agent(replies: Vec<CompletionReply>) -> Agent {
        Agent::new(
            "test_agent",
            Arc::new(Scripted(Mutex::new(replies.into()))),
            Arc::new(ToolContext::new(Arc::new(Numbered))),
            "gpt-4o",
        )
        .with_tools(&[ToolKind::SearchImages])
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "search_images".to_string(),
            arguments: r#"{"query": "cubism"}"#.to_string(),
            result: r#"{"url": ""}"#.to_string(),
            image_url: None,
        };
        assert_eq!(format!("{}", record), r#"search_images({"query": "cubism"})"#);
    }

    #[tokio::test]
    async fn test_run_with_tool_calls() {
        let a = agent(vec![
            CompletionReply::tool_calls(vec![
                ToolInvocation::new("1", "search_images", r#"{"query": "a"}"#),
                ToolInvocation::new("2", "search_images", r#"{"query": "b"}"#),
            ]),
            CompletionReply::text("{}"),
        ]);
        let response = a.run("task").await.unwrap();
        assert_eq!(response.iterations, 2);
        assert_eq!(response.count_calls("search_images"), 2);
        assert!(response.looked_up_images().contains("https://img.test/b.jpg"));
    }

    #[tokio::test]
    async fn test_tool_outside_toolset_is_refused() {
        let a = agent(vec![
            CompletionReply::tool_calls(vec![ToolInvocation::new("1", "get_gameplay_ideas", "{}")]),
            CompletionReply::text("done"),
        ]);
        let response = a.run("task").await.unwrap();
        assert!(response.tool_calls[0].result.contains("not available"));
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let looping = (0..5)
            .map(|i| {
                CompletionReply::tool_calls(vec![ToolInvocation::new(
                    i.to_string(),
                    "search_images",
                    r#"{"query": "again"}"#,
                )])
            })
            .collect();
        let a = agent(looping).with_max_iterations(3);
        assert!(matches!(a.run("task").await, Err(LearnieError::Agent(_))));
    }
}
