//! Learnie - a multi-agent tutoring assistant
//!
//! Turns a learner's wish ("I want to learn basic statistics") into a
//! structured learning plan, writes illustrated material for each subtopic,
//! and builds quizzes and playable HTML games to practice with.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and role prompts
//! - `schema` - Topic, material, quiz and game contracts with validation
//! - `completion` - Chat completion abstraction used by every agent
//! - `openai` - OpenAI implementation of the completion service
//! - `image_search` - Image lookup behind the `search_images` tool
//! - `agent` - Tool calling loop shared by all agents
//! - `tutor` - The four content agents and their retry policy
//! - `coordinator` - Session state, intent routing and progress tracking
//!
//! # Example
//!
//! ```rust,no_run
//! use learnie::config::Settings;
//! use learnie::coordinator::{TutorCoordinator, TutorReply};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut tutor = TutorCoordinator::from_settings(&settings)?;
//!
//!     if let TutorReply::TopicCreated { topic } =
//!         tutor.handle("I want to learn basic statistics").await?
//!     {
//!         println!("{}", topic.outline());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod completion;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod image_search;
pub mod openai;
pub mod schema;
pub mod tutor;

pub use error::{LearnieError, Result};
