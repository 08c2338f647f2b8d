//! CLI module for Hjelper.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Hjelper - chat assistant with web search, PDF retrieval and CSV analysis
///
/// An agent answers each question by calling whichever tools fit: Tavily web
/// search, similarity search over uploaded PDFs, or Python against an
/// uploaded CSV.
#[derive(Parser, Debug)]
#[command(name = "hjelper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// API keys, from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    pub openai_api_key: String,

    /// Tavily API key
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true, default_value = "")]
    pub tavily_api_key: String,
}

/// Files to make available to the agent.
#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// PDF file to search (repeatable)
    #[arg(long = "pdf", value_name = "FILE")]
    pub pdfs: Vec<PathBuf>,

    /// CSV file to analyze
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Start an interactive chat session
    Chat {
        #[command(flatten)]
        keys: KeyArgs,

        #[command(flatten)]
        uploads: UploadArgs,
    },

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        #[command(flatten)]
        keys: KeyArgs,

        #[command(flatten)]
        uploads: UploadArgs,
    },

    /// Start the web chat UI
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_with_uploads() {
        let cli = Cli::try_parse_from([
            "hjelper",
            "chat",
            "--openai-api-key",
            "sk-1",
            "--tavily-api-key",
            "tvly-1",
            "--pdf",
            "a.pdf",
            "--pdf",
            "b.pdf",
            "--csv",
            "d.csv",
        ])
        .unwrap();

        match cli.command {
            Commands::Chat { keys, uploads } => {
                assert_eq!(keys.openai_api_key, "sk-1");
                assert_eq!(keys.tavily_api_key, "tvly-1");
                assert_eq!(uploads.pdfs, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
                assert_eq!(uploads.csv, Some(PathBuf::from("d.csv")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_and_verbosity() {
        let cli = Cli::try_parse_from(["hjelper", "-vv", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Serve { host: None, port: Some(9000) }));
    }
}
