//! Hjelper - a tool-calling chat assistant
//!
//! Each question goes to an LLM agent that may call up to three tools:
//!
//! - `web_search` - Tavily web search, always available
//! - `pdf_search` - similarity search over uploaded PDFs
//! - `csv_repl` - Python (pandas) executed against an uploaded CSV
//!
//! The reply combines the agent's answer with a summary of the tools that
//! actually contributed to it.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `loader` - Uploaded files: PDF text extraction, CSV parsing
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity index
//! - `tools` - The three agent tools
//! - `agent` - Tool-calling executor and per-turn summary
//! - `session` - Credentials, uploads, transcript and cached tools
//!
//! # Example
//!
//! ```rust,no_run
//! use hjelper::config::{Prompts, Settings};
//! use hjelper::session::{Credentials, Session};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Arc::new(Settings::load()?);
//!     let mut session = Session::new(settings, Arc::new(Prompts::default()));
//!     session.set_credentials(Credentials::new("sk-...", "tvly-..."));
//!
//!     let turn = session.ask("한전KDN은 어떤 회사야?").await?;
//!     println!("{}", turn.reply);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod openai;
pub mod session;
pub mod tools;
pub mod vector_store;

pub use error::{HjelperError, Result};
