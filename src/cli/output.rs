//! CLI output formatting utilities.

use crate::schema::{MaterialArticle, QuizResult, Topic};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a topic plan with subtopic ids.
    pub fn topic(topic: &Topic) {
        Output::header(&topic.title);
        Output::kv("Subject", &topic.subject);
        for (i, section) in topic.sections.iter().enumerate() {
            println!(
                "\n  {} {}",
                style(format!("{}.", i + 1)).cyan().bold(),
                style(&section.title).bold()
            );
            if !section.image_url.is_empty() {
                println!("     {}", style(&section.image_url).dim());
            }
            for (j, subtopic) in section.subtopics.iter().enumerate() {
                println!(
                    "     {} {}",
                    style(format!("{}.{}", i + 1, j + 1)).dim(),
                    subtopic.title
                );
            }
        }
        println!();
    }

    /// Print an article block by block.
    pub fn article(article: &MaterialArticle) {
        Output::header(&article.title);
        if !article.summary.is_empty() {
            println!("{}\n", style(&article.summary).italic());
        }
        for block in &article.material {
            println!("{}\n", block.text);
            match block.image() {
                Some(url) => println!(
                    "  {} {}\n  {}\n",
                    style("[image]").cyan(),
                    url,
                    style(&block.image_description).dim()
                ),
                None => println!(
                    "  {} {}\n",
                    style("[no image]").dim(),
                    style(&block.image_description).dim()
                ),
            }
        }
        if !article.references.is_empty() {
            println!("{}", style("References").bold());
            for reference in &article.references {
                Output::list_item(reference);
            }
            println!();
        }
    }

    /// Print a graded quiz.
    pub fn quiz_result(result: &QuizResult) {
        Output::header(&format!("{} - results", result.title));
        for (i, question) in result.questions.iter().enumerate() {
            let mark = if question.is_correct {
                style("✓").green()
            } else {
                style("✗").red()
            };
            println!("  {} {}. {}", mark, i + 1, question.question);
            if !question.is_correct {
                println!(
                    "      {} {}",
                    style("correct answer:").dim(),
                    question.correct_answer
                );
            }
        }
        println!();
        let summary = format!(
            "{}/{} correct, score {}",
            result.correct, result.total, result.score
        );
        if result.passed {
            Output::success(&format!("Passed: {}", summary));
        } else {
            Output::warning(&format!("Not passed yet: {}", summary));
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        format!("{}...", content.chars().take(max_chars).collect::<String>())
    }
}
