//! Interactive chat command.

use super::open_session;
use crate::cli::preflight::{self, Operation};
use crate::cli::{KeyArgs, Output, UploadArgs};
use crate::config::Settings;
use crate::session::Credentials;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(keys: &KeyArgs, uploads: &UploadArgs, settings: Settings) -> anyhow::Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(
        Operation::Chat { with_csv: uploads.csv.is_some() },
        &Credentials::from(keys),
        &settings,
    ) {
        Output::error(&format!("{}", e));
        Output::info("Run 'hjelper doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut session = open_session(settings, keys, uploads)?;

    println!("\n{}", style("Hjelper Chat").bold().cyan());
    for pdf in &session.uploads().pdfs {
        Output::kv("PDF", &pdf.name);
    }
    if let Some(csv) = &session.uploads().csv {
        Output::kv("CSV", &csv.name);
    }
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
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

        if input.eq_ignore_ascii_case("clear") {
            session.clear_transcript();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = session.ask(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(turn) => Output::turn(&turn),
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    session.close();
    Ok(())
}
