//! Tool-calling agent.
//!
//! The agent binds a chat model, a four-part prompt and a tool set. On each
//! turn the model decides which tools to call; the executor runs them, feeds
//! the observations back and returns the final answer together with the full
//! trace of tool calls.

mod executor;
pub(crate) mod model;
mod prompt;
mod turn;

pub use executor::{AgentExecutor, AgentOutput, IntermediateStep, DEFAULT_MAX_ITERATIONS, STOPPED_OUTPUT};
pub use model::{ChatModel, ModelTurn, OpenAIChatModel, ToolInvocation};
pub use prompt::PromptTemplate;
pub use turn::{format_reply, run_turn, used_tools, TurnResult, MIN_OBSERVATION_CHARS, NO_TOOLS};

use crate::config::{LlmSettings, Prompts};
use crate::error::Result;
use crate::tools::ToolSet;
use std::sync::Arc;

/// Build an agent for one turn.
pub fn build_agent(
    model: Arc<dyn ChatModel>,
    prompts: &Prompts,
    variable: &str,
    settings: &LlmSettings,
    tools: ToolSet,
) -> AgentExecutor {
    AgentExecutor::new(model, PromptTemplate::new(prompts.system_prompt(variable)), tools)
        .with_max_iterations(settings.max_iterations)
        .with_verbose(settings.verbose)
}

/// Create the OpenAI model client described by the settings.
pub fn openai_model(api_key: &str, settings: &LlmSettings) -> Result<Arc<dyn ChatModel>> {
    Ok(Arc::new(OpenAIChatModel::new(api_key, &settings.model)?))
}
