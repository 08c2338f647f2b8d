//! Agent executor with the tool calling loop.

use super::model::{ChatModel, ModelTurn, ToolInvocation};
use super::prompt::PromptTemplate;
use crate::error::{HjelperError, Result};
use crate::session::ChatMessage;
use crate::tools::ToolSet;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestToolMessageArgs,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default cap on model calls per turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Output returned when the iteration cap is hit.
pub const STOPPED_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

/// Tool-calling agent bound to a prompt and a tool set.
pub struct AgentExecutor {
    model: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    tools: ToolSet,
    max_iterations: usize,
    verbose: bool,
}

impl AgentExecutor {
    /// Create a new executor.
    pub fn new(model: Arc<dyn ChatModel>, prompt: PromptTemplate, tools: ToolSet) -> Self {
        Self {
            model,
            prompt,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verbose: false,
        }
    }

    /// Set maximum model calls per invocation.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Log every step at info level.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Tools available to this agent.
    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Run the agent on one input.
    ///
    /// Tool failures are fed back to the model as observations; only model
    /// errors abort the invocation.
    #[instrument(skip(self, history), fields(model = self.model.model_name(), tools = ?self.tools.names()))]
    pub async fn invoke(&self, input: &str, history: &[ChatMessage]) -> Result<AgentOutput> {
        let definitions = self.tools.definitions();
        let mut scratchpad: Vec<ChatCompletionRequestMessage> = Vec::new();
        let mut steps = Vec::new();
        let mut iterations = 0;

        loop {
            if iterations >= self.max_iterations {
                warn!("Agent exceeded maximum iterations ({})", self.max_iterations);
                return Ok(AgentOutput {
                    output: STOPPED_OUTPUT.to_string(),
                    intermediate_steps: steps,
                    iterations,
                });
            }
            iterations += 1;

            debug!("Agent iteration {}", iterations);

            let messages = self.prompt.format(history, input, &scratchpad)?;
            let calls = match self.model.complete(&messages, &definitions).await? {
                ModelTurn::Final(output) => {
                    if self.verbose {
                        info!("Agent finished after {} iteration(s)", iterations);
                    }
                    return Ok(AgentOutput {
                        output,
                        intermediate_steps: steps,
                        iterations,
                    });
                }
                ModelTurn::ToolCalls(calls) => calls,
            };

            let api_calls: Vec<ChatCompletionMessageToolCall> = calls.iter().map(Into::into).collect();
            scratchpad.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(api_calls)
                    .build()
                    .map_err(|e| HjelperError::Agent(e.to_string()))?
                    .into(),
            );

            for call in &calls {
                let step = self.execute_tool_call(call).await;

                scratchpad.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&call.id)
                        .content(step.observation.clone())
                        .build()
                        .map_err(|e| HjelperError::Agent(e.to_string()))?
                        .into(),
                );

                steps.push(step);
            }
        }
    }

    /// Execute a single tool call and record it.
    async fn execute_tool_call(&self, call: &ToolInvocation) -> IntermediateStep {
        if self.verbose {
            info!("Invoking: `{}` with `{}`", call.name, call.arguments);
        }

        let observation = match self.tools.get(&call.name) {
            Some(tool) => match tool.call(&call.arguments).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            None => format!(
                "{} is not a valid tool, try one of [{}].",
                call.name,
                self.tools.names().join(", ")
            ),
        };

        if self.verbose {
            info!("Observation from `{}`: {}", call.name, preview(&observation, 500));
        }

        IntermediateStep {
            tool: call.name.clone(),
            tool_input: call.arguments.clone(),
            observation,
        }
    }
}

fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}

/// Result of one agent invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutput {
    /// The final answer.
    pub output: String,
    /// Every tool call made, in order.
    pub intermediate_steps: Vec<IntermediateStep>,
    /// Number of model calls used.
    pub iterations: usize,
}

/// One tool call and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntermediateStep {
    /// Name of the tool called.
    pub tool: String,
    /// JSON arguments passed to the tool.
    pub tool_input: String,
    /// Raw observation returned to the model.
    pub observation: String,
}

impl IntermediateStep {
    /// Record one tool call and what it returned.
    pub fn new(tool: &str, observation: &str) -> Self {
        Self {
            tool: tool.to_string(),
            tool_input: String::new(),
            observation: observation.to_string(),
        }
    }
}

impl std::fmt::Display for IntermediateStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.tool, self.tool_input)
    }
}
