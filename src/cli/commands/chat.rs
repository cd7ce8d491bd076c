//! Interactive tutoring session.

use super::game::{game_file_name, save_game};
use super::quiz::take_quiz;
use super::topic::ask_clarifications;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::coordinator::{ProgressReport, TutorCoordinator, TutorReply};
use crate::error::LearnieError;
use crate::schema::SubtopicId;
use crate::tutor::TopicPreferences;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Session, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'learnie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut tutor = TutorCoordinator::from_settings(&settings)?;

    println!("\n{}", style("Learnie").bold().cyan());
    println!(
        "{}\n",
        style("Tell me what you want to learn, or 'exit' to quit. Type 'help' for commands.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("help") {
            println!("\n{}\n", tutor_help(&tutor));
            continue;
        }

        if let Some(command) = planning_command(input) {
            if let Err(e) = run_planning(&mut tutor, command, &settings).await {
                Output::error(&format!("Error: {}", e));
            }
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let reply = tutor.handle(input).await;
        spinner.finish_and_clear();

        match reply {
            Ok(reply) => {
                if let Err(e) = show_reply(&mut tutor, reply, &settings) {
                    Output::error(&format!("Error: {}", e));
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
                if matches!(e, LearnieError::Config(_)) {
                    Output::info("Run 'learnie doctor' for detailed diagnostics.");
                }
            }
        }
    }

    Ok(())
}

const COMMANDS: &str = "Commands:
  /topic <request>
  /plan <request>                  answer a few questions, then plan
  /subtopic <subtopic> [request]   add a subtopic deepening <subtopic>
  /suggest <subtopic>              ideas for new subtopics
  /material <subtopic>
  /quiz <subtopic> [true_false|choice]
  /game <subtopic> [description]
  /progress <subtopic>

Subtopics can be given by number (1.2) or by title.";

fn tutor_help(tutor: &TutorCoordinator) -> String {
    match tutor.topic() {
        Some(topic) => format!("{}\n\nCurrent plan:\n{}", COMMANDS, topic.outline()),
        None => COMMANDS.to_string(),
    }
}

/// REPL commands that shape the plan itself.
#[derive(Debug, PartialEq)]
enum PlanningCommand<'a> {
    Plan(&'a str),
    Subtopic {
        parent: &'a str,
        context: Option<&'a str>,
    },
    Suggest(&'a str),
}

fn planning_command(input: &str) -> Option<PlanningCommand<'_>> {
    let (command, rest) = input
        .split_once(char::is_whitespace)
        .unwrap_or((input, ""));
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    match command.to_ascii_lowercase().as_str() {
        "/plan" => Some(PlanningCommand::Plan(rest)),
        "/subtopic" => {
            let (parent, context) = match rest.split_once(char::is_whitespace) {
                Some((parent, context)) => (parent, Some(context.trim())),
                None => (rest, None),
            };
            Some(PlanningCommand::Subtopic { parent, context })
        }
        "/suggest" => Some(PlanningCommand::Suggest(rest)),
        _ => None,
    }
}

async fn run_planning(
    tutor: &mut TutorCoordinator,
    command: PlanningCommand<'_>,
    settings: &Settings,
) -> Result<()> {
    match command {
        PlanningCommand::Plan(request) => {
            let spinner = Output::spinner("Thinking of a few questions...");
            let questions = tutor.clarification_questions(request, &[]).await;
            spinner.finish_and_clear();

            let preferences = TopicPreferences {
                learning_style: settings.learning_style.clone(),
                clarifications: ask_clarifications(questions?)?,
            };
            let spinner = Output::spinner("Planning your learning path...");
            let topic = tutor.create_topic_with(request, &preferences).await;
            spinner.finish_and_clear();

            Output::topic(topic?);
            Output::info("Ask for material on any subtopic, e.g. \"/material 1.1\".");
        }
        PlanningCommand::Subtopic { parent, context } => {
            let spinner = Output::spinner("Writing a new subtopic...");
            let result = tutor.add_subtopic(parent, context).await;
            spinner.finish_and_clear();

            let (id, subtopic) = result?;
            Output::success(&format!("Added {} {}", id, subtopic.title));
        }
        PlanningCommand::Suggest(parent) => {
            let spinner = Output::spinner("Looking for subtopics to add...");
            let result = tutor.suggest_subtopics(parent).await;
            spinner.finish_and_clear();

            for suggestion in result? {
                Output::list_item(&format!(
                    "{} {}",
                    style(&suggestion.title).bold(),
                    style(&suggestion.description).dim()
                ));
            }
            Output::info(&format!("Add one with \"/subtopic {} <what it should cover>\".", parent));
        }
    }
    Ok(())
}

/// Print a reply and run any follow-up it needs.
fn show_reply(tutor: &mut TutorCoordinator, reply: TutorReply, settings: &Settings) -> Result<()> {
    match reply {
        TutorReply::TopicCreated { topic } => {
            Output::topic(&topic);
            Output::info("Ask for material on any subtopic, e.g. \"/material 1.1\".");
        }
        TutorReply::Material { subtopic, article } => {
            Output::article(&article);
            print_score(subtopic, tutor.report_progress(subtopic)?);
        }
        TutorReply::Quiz { subtopic, quiz } => {
            let Some(answers) = take_quiz(&quiz)? else {
                Output::info("Quiz set aside. Ask for it again any time.");
                return Ok(());
            };
            let result = tutor.record_quiz_answers(subtopic, &answers)?;
            Output::quiz_result(&result);
            print_score(subtopic, tutor.report_progress(subtopic)?);
        }
        TutorReply::Game { subtopic, game } => {
            let path = settings
                .games_dir()
                .join(game_file_name(&format!("game {}", subtopic)));
            save_game(&game, &path)?;
            Output::success(&format!("Game saved to {}", path.display()));
            Output::info("Open it in a browser, then enter the score you reached (empty to skip).");

            if let Some(score) = read_score()? {
                let recorded = tutor.record_game_score(subtopic, score)?;
                Output::kv("Game score", &recorded.to_string());
                print_score(subtopic, tutor.report_progress(subtopic)?);
            }
        }
        TutorReply::Progress { report } => print_report(&report),
        TutorReply::Message { text } => {
            println!("\n{} {}\n", style("Learnie:").cyan().bold(), text);
        }
        TutorReply::TryAgain { text } => Output::warning(&text),
    }
    Ok(())
}

fn read_score() -> Result<Option<i64>> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("{} ", style("Score:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        match input.parse::<i64>() {
            Ok(score) => return Ok(Some(score)),
            Err(_) => Output::warning("Please enter a number between 0 and 100."),
        }
    }
}

fn print_score(subtopic: SubtopicId, score: u8) {
    Output::kv(&format!("Progress on {}", subtopic), &format!("{}/100", score));
    println!();
}

fn print_report(report: &ProgressReport) {
    Output::header(&format!("Progress on {}", report.subtopic));
    Output::kv("Score", &format!("{}/100", report.score));
    Output::kv("Materials viewed", &report.materials_viewed.to_string());
    Output::kv("Practice attempts", &report.practice_attempts.to_string());
    if let Some(latest) = report.latest_practice {
        Output::kv("Latest practice score", &latest.to_string());
    }
    println!();
}
