//! Learnie CLI entry point.

use anyhow::Result;
use clap::Parser;
use learnie::cli::{commands, Cli, Commands};
use learnie::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("learnie={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.games_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Topic {
            request,
            output,
            clarify,
            style,
        } => {
            settings.learning_style = style.apply(settings.learning_style.take())?;
            commands::run_topic(request, output.clone(), *clarify, settings).await?;
        }

        Commands::Subtopic {
            plan,
            parent,
            context,
            suggest,
            output,
        } => {
            commands::run_subtopic(
                plan,
                parent,
                context.as_deref(),
                *suggest,
                output.clone(),
                settings,
            )
            .await?;
        }

        Commands::Material {
            topic,
            section,
            subtopic,
            summary,
            output,
            style,
        } => {
            settings.learning_style = style.apply(settings.learning_style.take())?;
            commands::run_material(
                topic,
                section,
                subtopic,
                summary.clone(),
                output.clone(),
                settings,
            )
            .await?;
        }

        Commands::Quiz {
            subtopic,
            kind,
            material_file,
            topic,
            section,
            json,
            style,
        } => {
            settings.learning_style = style.apply(settings.learning_style.take())?;
            commands::run_quiz(
                subtopic,
                kind,
                material_file.clone(),
                topic.clone(),
                section.clone(),
                *json,
                settings,
            )
            .await?;
        }

        Commands::Game {
            description,
            material_file,
            output,
        } => {
            commands::run_game(description, material_file, output.clone(), settings).await?;
        }

        Commands::Chat => {
            commands::run_chat(settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
