//! Ask command - answer a single question.

use super::open_session;
use crate::cli::preflight::{self, Operation};
use crate::cli::{KeyArgs, Output, UploadArgs};
use crate::config::Settings;
use crate::session::Credentials;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    keys: &KeyArgs,
    uploads: &UploadArgs,
    settings: Settings,
) -> anyhow::Result<()> {
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

    let spinner = Output::spinner("Thinking...");
    let result = session.ask(question).await;
    spinner.finish_and_clear();

    let turn = result?;
    Output::turn(&turn);
    session.close();

    Ok(())
}
