//! Configuration module for Learnie.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    CoordinatorPrompts, GamePrompts, MaterialsPrompts, Prompts, QuizPrompts, TopicPrompts,
};
pub use settings::{
    GeneralSettings, GenerationSettings, ImageSearchSettings, ModelSettings, ProgressSettings,
    PromptSettings, ServerSettings, Settings,
};
