//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::process::Command;

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
    Output::header("Hjelper Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    // Check the CSV tool's interpreter
    println!("{}", style("External Tools").bold());
    let python_check = check_python(&settings.csv.python);
    python_check.print();
    checks.push(python_check);

    println!();

    // Check API keys
    println!("{}", style("API Configuration").bold());
    let key_checks = [
        check_api_key("OPENAI_API_KEY", "sk-", std::env::var("OPENAI_API_KEY").ok()),
        check_api_key("TAVILY_API_KEY", "tvly-", std::env::var("TAVILY_API_KEY").ok()),
    ];
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

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
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Hjelper.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Hjelper is ready to use.");
    }

    Ok(())
}

/// Check that the interpreter runs and has pandas.
fn check_python(python: &str) -> CheckResult {
    match Command::new(python).args(["-c", "import pandas; print(pandas.__version__)"]).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            CheckResult::ok(python, &format!("pandas {}", version))
        }
        Ok(_) => CheckResult::warning(
            python,
            "installed but pandas is missing",
            "Install with: pip install pandas (needed for CSV analysis)",
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::warning(
            python,
            "not found",
            install_hint_python(),
        ),
        Err(e) => CheckResult::error(python, &format!("error: {}", e), install_hint_python()),
    }
}

/// Check that an API key is available in the environment.
///
/// Missing keys are only a warning: the web UI collects them per session.
fn check_api_key(name: &str, prefix: &str, value: Option<String>) -> CheckResult {
    let hint = format!("Set with: export {}='{}...' or pass it as a flag", name, prefix);
    match value {
        Some(key) if key.starts_with(prefix) && key.chars().count() > 12 => {
            CheckResult::ok(name, &format!("configured ({})", mask_key(&key)))
        }
        Some(key) if key.trim().is_empty() => CheckResult::warning(name, "empty", &hint),
        Some(_) => CheckResult::warning(
            name,
            "set but format looks unusual",
            &format!("Expected format: {}...", prefix),
        ),
        None => CheckResult::warning(name, "not set", &hint),
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check data directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    [("Data directory", settings.data_dir()), ("Temp directory", settings.temp_dir())]
        .into_iter()
        .map(|(name, dir)| {
            if dir.exists() {
                let size = dir_size(&dir);
                CheckResult::ok(name, &format!("{} ({})", dir.display(), format_size(size)))
            } else {
                CheckResult::warning(
                    name,
                    &format!("{} (will be created)", dir.display()),
                    "Directory will be created on first use",
                )
            }
        })
        .collect()
}

fn dir_size(dir: &std::path::Path) -> u64 {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.metadata().ok())
                .filter(|m| m.is_file())
                .map(|m| m.len())
                .sum()
        })
        .unwrap_or(0)
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
            "Create with: hjelper config edit",
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

/// Platform-specific install hint for Python.
fn install_hint_python() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install python && pip3 install pandas"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install python3 python3-pandas (or your package manager)"
    } else {
        "Install from: https://www.python.org/downloads/"
    }
}
