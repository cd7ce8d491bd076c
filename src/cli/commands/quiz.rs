//! Quiz command - generate a quiz and take it in the terminal.

use super::load_material;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::schema::{Quiz, QuizAnswer, QuizKind, QuizQuestion};
use crate::tutor::{AgentFactory, QuizRequest};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the quiz command.
#[allow(clippy::too_many_arguments)]
pub async fn run_quiz(
    subtopic: &str,
    kind: &str,
    material_file: Option<String>,
    topic: Option<String>,
    section: Option<String>,
    json: bool,
    settings: Settings,
) -> Result<()> {
    let kind: QuizKind = kind.parse()?;

    if let Err(e) = preflight::check(Operation::Completion, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'learnie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let material = material_file.as_deref().map(load_material).transpose()?;
    let request = QuizRequest {
        topic: topic.unwrap_or_else(|| subtopic.to_string()),
        section: section.unwrap_or_else(|| subtopic.to_string()),
        subtopic_title: subtopic.to_string(),
        subtopic_summary: None,
        material,
        learning_style: settings.learning_style.clone(),
    };

    let factory = AgentFactory::from_settings(&settings)?;

    let spinner = Output::spinner(&format!("Writing a {} quiz...", kind));
    let result = factory.quiz().generate_quiz(&request, kind).await;
    spinner.finish_and_clear();
    let quiz = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&quiz)?);
        return Ok(());
    }

    let Some(answers) = take_quiz(&quiz)? else {
        Output::info("Quiz abandoned.");
        return Ok(());
    };
    let result = quiz.grade(&answers, settings.progress.quiz_pass_mark)?;
    Output::quiz_result(&result);
    print_explanations(&quiz, &answers);

    Ok(())
}

/// Ask every question on stdin. Returns `None` if the learner quits.
pub(crate) fn take_quiz(quiz: &Quiz) -> Result<Option<Vec<QuizAnswer>>> {
    Output::header(&quiz.title);
    println!(
        "{}\n",
        style("Answer each question, or 'q' to stop.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut answers = Vec::with_capacity(quiz.questions.len());

    for (i, question) in quiz.questions.iter().enumerate() {
        println!("{} {}", style(format!("{}.", i + 1)).cyan().bold(), question.question());
        let hint = match question {
            QuizQuestion::TrueFalse { .. } => "[t/f]".to_string(),
            QuizQuestion::Choice { options, .. } => {
                for (n, option) in options.iter().enumerate() {
                    println!("   {} {}", style(format!("{})", n + 1)).dim(), option);
                }
                format!("[1-{}]", options.len())
            }
        };

        loop {
            print!("{} ", style(hint.as_str()).green());
            stdout.flush()?;

            let mut input = String::new();
            if stdin.lock().read_line(&mut input)? == 0 {
                return Ok(None);
            }
            let input = input.trim();
            if input.eq_ignore_ascii_case("q") {
                return Ok(None);
            }

            match parse_answer(question, input) {
                Some(answer) => {
                    answers.push(answer);
                    break;
                }
                None => Output::warning(&format!("Please answer with {}", hint)),
            }
        }
        println!();
    }

    Ok(Some(answers))
}

/// Read a learner's answer to a question.
pub(crate) fn parse_answer(question: &QuizQuestion, input: &str) -> Option<QuizAnswer> {
    match question {
        QuizQuestion::TrueFalse { .. } => match input.to_lowercase().as_str() {
            "t" | "true" | "y" | "yes" => Some(QuizAnswer::TrueFalse(true)),
            "f" | "false" | "n" | "no" => Some(QuizAnswer::TrueFalse(false)),
            _ => None,
        },
        QuizQuestion::Choice { options, .. } => match input.parse::<usize>() {
            Ok(n) if n >= 1 && n <= options.len() => Some(QuizAnswer::Choice(n - 1)),
            _ => None,
        },
    }
}

fn print_explanations(quiz: &Quiz, answers: &[QuizAnswer]) {
    let missed: Vec<_> = quiz
        .questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.correct_answer() != **a)
        .filter_map(|(q, _)| q.explanation().map(|e| (q.question(), e)))
        .collect();

    if missed.is_empty() {
        return;
    }

    println!("\n{}", style("Explanations").bold());
    for (question, explanation) in missed {
        Output::list_item(&format!("{} {}", style(question).dim(), explanation));
    }
}
