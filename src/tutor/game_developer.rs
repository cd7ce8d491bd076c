//! Browser learning games.

use super::{with_feedback, with_retries};
use crate::agent::{Agent, ToolKind, GET_GAMEPLAY_IDEAS};
use crate::config::Prompts;
use crate::error::{LearnieError, Result};
use crate::schema::{GameArtifact, GAME_HEIGHT, GAME_WIDTH};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct GameDeveloperAgent {
    agent: Agent,
    prompts: Arc<Prompts>,
    max_retries: usize,
}

impl GameDeveloperAgent {
    pub fn new(agent: Agent, prompts: Arc<Prompts>, max_retries: usize) -> Self {
        Self {
            agent: agent.with_tools(&[ToolKind::GetGameplayIdeas]),
            prompts,
            max_retries,
        }
    }

    /// Build a game that drills the given material.
    #[instrument(skip(self, material))]
    pub async fn generate_game(&self, game_description: &str, material: &str) -> Result<GameArtifact> {
        if material.trim().is_empty() {
            return Err(LearnieError::InvalidInput(
                "A game needs material to be based on".to_string(),
            ));
        }

        let mut vars = HashMap::new();
        vars.insert("description".to_string(), game_description.to_string());
        vars.insert("material".to_string(), material.to_string());
        vars.insert("width".to_string(), GAME_WIDTH.to_string());
        vars.insert("height".to_string(), GAME_HEIGHT.to_string());
        let system = self.prompts.render_with_custom(&self.prompts.game.system, &vars);
        let task = self.prompts.render_with_custom(&self.prompts.game.user, &vars);
        let agent = self.agent.clone().with_system_prompt(&system);

        with_retries("game", self.max_retries, |feedback| {
            let agent = &agent;
            let task = with_feedback(&task, feedback.as_deref());
            async move {
                let response = agent.run(&task).await?;
                debug!("Game response: {}", crate::schema::preview(&response.content));

                if !response.called(GET_GAMEPLAY_IDEAS) {
                    warn!("Game was generated without consulting the gameplay ideas");
                }

                let game = GameArtifact::from_model_output(&response.content)?;
                info!("Generated game ({} bytes of HTML)", game.html().len());
                Ok(game)
            }
        })
        .await
    }
}
