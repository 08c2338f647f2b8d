//! Configuration module for Hjelper.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    ChunkingSettings, CsvSettings, EmbeddingSettings, GeneralSettings, LlmSettings,
    PromptSettings, RetrievalSettings, SearchSettings, ServerSettings, Settings,
};
