//! Factories for the external services a session talks to.

use super::Credentials;
use crate::agent::{openai_model, ChatModel};
use crate::config::{EmbeddingSettings, LlmSettings, SearchSettings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::tools::{Tool, WebSearchTool};
use std::sync::Arc;

/// Creates the model, embedder and search clients for a session.
pub trait Services: Send + Sync {
    /// Chat model used by the agent.
    fn chat_model(&self, credentials: &Credentials, settings: &LlmSettings) -> Result<Arc<dyn ChatModel>>;

    /// Embedder used to index PDFs and embed queries.
    fn embedder(&self, credentials: &Credentials, settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>>;

    /// The always-present web search tool.
    fn web_search(
        &self,
        credentials: &Credentials,
        settings: &SearchSettings,
        description: &str,
    ) -> Result<Arc<dyn Tool>>;
}

/// OpenAI for chat and embeddings, Tavily for search.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultServices;

impl Services for DefaultServices {
    fn chat_model(&self, credentials: &Credentials, settings: &LlmSettings) -> Result<Arc<dyn ChatModel>> {
        openai_model(&credentials.openai_api_key, settings)
    }

    fn embedder(&self, credentials: &Credentials, settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
        Ok(Arc::new(OpenAIEmbedder::with_config(
            &credentials.openai_api_key,
            &settings.model,
            settings.dimensions as usize,
        )?))
    }

    fn web_search(
        &self,
        credentials: &Credentials,
        settings: &SearchSettings,
        description: &str,
    ) -> Result<Arc<dyn Tool>> {
        Ok(Arc::new(WebSearchTool::new(
            &credentials.tavily_api_key,
            settings,
            description,
        )?))
    }
}
