//! Agent system for task execution with tool calling.
//!
//! Every tutoring agent is an [`Agent`] with its own role prompt and toolset,
//! running against a shared [`CompletionService`](crate::completion::CompletionService).

mod runner;
mod tools;

pub use runner::{Agent, AgentResponse, ToolCallRecord};
pub use tools::{
    parse_tool_call, tool_definitions, ToolCall, ToolContext, ToolKind, ToolOutput,
    GET_GAMEPLAY_IDEAS, SEARCH_IMAGES,
};
