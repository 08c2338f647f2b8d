//! Error types for Hjelper.

use thiserror::Error;

/// Library-level error type for Hjelper operations.
#[derive(Error, Debug)]
pub enum HjelperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    MissingCredentials(String),

    #[error("PDF loading failed: {0}")]
    Pdf(String),

    #[error("CSV loading failed: {0}")]
    Csv(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Web search failed: {0}")]
    Search(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Tool failed: {0}")]
    Tool(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl From<csv::Error> for HjelperError {
    fn from(e: csv::Error) -> Self {
        HjelperError::Csv(e.to_string())
    }
}

/// Result type alias for Hjelper operations.
pub type Result<T> = std::result::Result<T, HjelperError>;
