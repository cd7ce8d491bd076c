//! Topic command - create a learning plan.

use super::write_json;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::schema::Clarification;
use crate::tutor::{AgentFactory, TopicPreferences};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the topic command.
pub async fn run_topic(
    request: &str,
    output: Option<String>,
    clarify: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Illustrated, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'learnie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let factory = AgentFactory::from_settings(&settings)?;
    let creator = factory.topic_creator();

    let clarifications = if clarify {
        let spinner = Output::spinner("Thinking of a few questions...");
        let result = creator.clarification_questions(request, &[]).await;
        spinner.finish_and_clear();
        ask_clarifications(result?)?
    } else {
        Vec::new()
    };
    let preferences = TopicPreferences {
        learning_style: settings.learning_style.clone(),
        clarifications,
    };

    let spinner = Output::spinner("Planning your learning path...");
    let result = creator.create_topic_with(request, &preferences).await;
    spinner.finish_and_clear();

    let topic = result?;
    Output::topic(&topic);

    let subtopics = topic.subtopics().count();
    Output::success(&format!(
        "{} sections, {} subtopics",
        topic.sections.len(),
        subtopics
    ));

    if let Some(path) = output {
        write_json(&path, &topic)?;
        Output::info(&format!("Plan saved to {}", path));
    }

    Ok(())
}

/// Ask each question on stdin. Blank answers are kept as unanswered.
pub(super) fn ask_clarifications(questions: Vec<Clarification>) -> Result<Vec<Clarification>> {
    if questions.is_empty() {
        return Ok(questions);
    }
    println!(
        "{}\n",
        style("A few questions first (press Enter to skip one).").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut answered = Vec::with_capacity(questions.len());
    for question in questions {
        println!("{} {}", style("?").cyan().bold(), question.question);
        print!("{} ", style(">").green());
        stdout.flush()?;

        let mut input = String::new();
        stdin.lock().read_line(&mut input)?;
        answered.push(with_answer(question, &input));
        println!();
    }
    Ok(answered)
}

fn with_answer(question: Clarification, input: &str) -> Clarification {
    let answer = input.trim();
    Clarification {
        answer: (!answer.is_empty()).then(|| answer.to_string()),
        ..question
    }
}
