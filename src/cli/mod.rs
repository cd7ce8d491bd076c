//! CLI module for Learnie.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::error::Result;
use crate::schema::LearningStyle;
use clap::{Args, Parser, Subcommand};

/// Learnie - a multi-agent tutor
///
/// Turns a learning wish into a structured plan, writes illustrated material
/// for each subtopic and builds quizzes and games to practice with.
#[derive(Parser, Debug)]
#[command(name = "learnie")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check credentials and configuration
    Doctor,

    /// Create a learning plan for a request
    Topic {
        /// What you want to learn, e.g. "I want to learn basic statistics"
        request: String,

        /// Write the plan as JSON to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Answer a few questions first so the plan fits you
        #[arg(long)]
        clarify: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Grow a saved plan by one subtopic, or suggest some
    Subtopic {
        /// Plan JSON written by `learnie topic --output`
        plan: String,

        /// Subtopic to deepen (id like 1.2, or its title)
        parent: String,

        /// What the new subtopic should cover
        #[arg(long)]
        context: Option<String>,

        /// Only print suggestions, leave the plan as it is
        #[arg(long, conflicts_with = "context")]
        suggest: bool,

        /// Write the grown plan here instead of overwriting PLAN
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Generate illustrated material for a subtopic
    Material {
        /// Topic title
        topic: String,

        /// Section title
        section: String,

        /// Subtopic title
        subtopic: String,

        /// Short brief describing the subtopic
        #[arg(short, long)]
        summary: Option<String>,

        /// Write the article as JSON to this file
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Generate a quiz for a subtopic and take it
    Quiz {
        /// Subtopic title
        subtopic: String,

        /// Quiz kind (true_false, choice)
        #[arg(short, long, default_value = "choice")]
        kind: String,

        /// Material the quiz should be based on (text or article JSON)
        #[arg(short, long)]
        material_file: Option<String>,

        /// Topic title for context
        #[arg(long)]
        topic: Option<String>,

        /// Section title for context
        #[arg(long)]
        section: Option<String>,

        /// Print the quiz as JSON instead of asking the questions
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Generate a learning game as an HTML file
    Game {
        /// Short description of the game you want
        description: String,

        /// Material the game should drill (text or article JSON)
        #[arg(short, long)]
        material_file: String,

        /// Output HTML file (defaults to the games directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Start an interactive tutoring session
    Chat,

    /// Start HTTP API server with tutoring sessions
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Learning style flags. Set flags override `[learning_style]` from the config.
#[derive(Args, Debug, Clone, Default)]
pub struct StyleArgs {
    /// Material size (small, medium, large)
    #[arg(long)]
    pub material_size: Option<String>,

    /// Material style (storytelling, bullet_points)
    #[arg(long)]
    pub material_style: Option<String>,

    /// Quiz difficulty (basic, medium, advanced)
    #[arg(long)]
    pub quiz_difficulty: Option<String>,

    /// Quiz size (small, medium, large)
    #[arg(long)]
    pub quiz_size: Option<String>,

    /// Learning plan type (explorer, achiever, social_learner)
    #[arg(long)]
    pub plan: Option<String>,
}

impl StyleArgs {
    fn is_empty(&self) -> bool {
        self.material_size.is_none()
            && self.material_style.is_none()
            && self.quiz_difficulty.is_none()
            && self.quiz_size.is_none()
            && self.plan.is_none()
    }

    /// Merge the flags over `base`. Without flags `base` is returned as is.
    pub fn apply(&self, base: Option<LearningStyle>) -> Result<Option<LearningStyle>> {
        if self.is_empty() {
            return Ok(base);
        }

        let mut style = base.unwrap_or_default();
        if let Some(size) = &self.material_size {
            style.material_size = size.parse()?;
        }
        if let Some(kind) = &self.material_style {
            style.material_style = kind.parse()?;
        }
        if let Some(difficulty) = &self.quiz_difficulty {
            style.quiz_difficulty = difficulty.parse()?;
        }
        if let Some(size) = &self.quiz_size {
            style.quiz_size = size.parse()?;
        }
        if let Some(plan) = &self.plan {
            style.plan_type = Some(plan.parse()?);
        }
        Ok(Some(style))
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
