//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Learnie Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    // Check API keys
    println!("{}", style("API Configuration").bold());
    let api_checks = vec![
        check_openai_api_key(std::env::var("OPENAI_API_KEY").ok()),
        check_brave_api_key(settings, std::env::var("BRAVE_API_KEY").ok()),
    ];
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);

    println!();

    // Check directories
    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    // Check configuration
    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(), check_models(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Learnie.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Learnie is ready to use.");
    }

    Ok(())
}

/// Show the first and last characters of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check if the OpenAI API key is configured.
fn check_openai_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask(&key)))
        }
        Some(key) if key.trim().is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check if the image search key is configured in settings or the environment.
fn check_brave_api_key(settings: &Settings, env_key: Option<String>) -> CheckResult {
    let configured = settings
        .image_search
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty());

    match (configured, env_key.filter(|k| !k.trim().is_empty())) {
        (Some(key), _) => CheckResult::ok(
            "BRAVE_API_KEY",
            &format!("configured in config file ({})", mask(&key)),
        ),
        (None, Some(key)) => {
            CheckResult::ok("BRAVE_API_KEY", &format!("configured ({})", mask(&key)))
        }
        (None, None) => CheckResult::error(
            "BRAVE_API_KEY",
            "not set, topics and materials cannot be illustrated",
            "Set with: export BRAVE_API_KEY='...' or image_search.api_key in the config file",
        ),
    }
}

/// Check data directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok(
            "Data directory",
            &format!("{}", data_dir.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let games_dir = settings.games_dir();
    match std::fs::read_dir(&games_dir) {
        Ok(entries) => {
            let (count, bytes) = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
                .fold((0usize, 0u64), |(count, bytes), e| {
                    let size = e.metadata().map(|m| m.len()).unwrap_or(0);
                    (count + 1, bytes + size)
                });
            results.push(CheckResult::ok(
                "Games directory",
                &format!(
                    "{} ({} game(s), {})",
                    games_dir.display(),
                    count,
                    format_size(bytes)
                ),
            ));
        }
        Err(_) => results.push(CheckResult::warning(
            "Games directory",
            &format!("{} (not created yet)", games_dir.display()),
            "Directory will be created when the first game is saved",
        )),
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: learnie config edit",
        )
    }
}

/// Every agent needs a model name.
fn check_models(settings: &Settings) -> CheckResult {
    let models = &settings.models;
    let missing: Vec<&str> = [
        ("coordinator", &models.coordinator),
        ("topic_creator", &models.topic_creator),
        ("materials", &models.materials),
        ("quiz", &models.quiz),
        ("game_developer", &models.game_developer),
    ]
    .into_iter()
    .filter(|(_, model)| model.trim().is_empty())
    .map(|(role, _)| role)
    .collect();

    if missing.is_empty() {
        CheckResult::ok(
            "Models",
            &format!(
                "topics: {}, materials: {}, quizzes: {}, games: {}",
                models.topic_creator, models.materials, models.quiz, models.game_developer
            ),
        )
    } else {
        CheckResult::error(
            "Models",
            &format!("no model set for: {}", missing.join(", ")),
            "Set the model names in the [models] section of the config file",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
