//! Chat model abstraction for the agent loop.

use crate::error::{HjelperError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FunctionCall,
};
use async_trait::async_trait;
use tracing::debug;

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Provider-assigned call ID, echoed back with the observation.
    pub id: String,
    /// Name of the tool to run.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

impl From<&ChatCompletionMessageToolCall> for ToolInvocation {
    fn from(call: &ChatCompletionMessageToolCall) -> Self {
        Self {
            id: call.id.clone(),
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        }
    }
}

impl From<&ToolInvocation> for ChatCompletionMessageToolCall {
    fn from(call: &ToolInvocation) -> Self {
        Self {
            id: call.id.clone(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

/// What the model decided to do on one step.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// The model answered.
    Final(String),
    /// The model wants these tools run before continuing.
    ToolCalls(Vec<ToolInvocation>),
}

/// A language model that can either answer or request tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion over the conversation so far.
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelTurn>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Sampling temperature for every agent call.
const TEMPERATURE: f32 = 0.0;

/// OpenAI chat completions with tool calling.
///
/// Sampling is always greedy so tool selection is reproducible.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    /// Create a model client.
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key)?,
            model: model.to_string(),
        })
    }

    fn request(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<CreateChatCompletionRequest> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages.to_vec())
            .temperature(TEMPERATURE);
        // The API rejects an empty tools array
        if !tools.is_empty() {
            args.tools(tools.to_vec());
        }
        args.build().map_err(|e| HjelperError::Agent(e.to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelTurn> {
        let request = self.request(messages, tools)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| HjelperError::OpenAI(format!("Agent API error: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| HjelperError::Agent("No response from model".to_string()))?;

        match &choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                debug!("Model requested {} tool call(s)", calls.len());
                Ok(ModelTurn::ToolCalls(calls.iter().map(ToolInvocation::from).collect()))
            }
            _ => Ok(ModelTurn::Final(choice.message.content.clone().unwrap_or_default())),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed sequence of turns and records what it was sent.
    pub struct ScriptedModel {
        turns: Mutex<VecDeque<ModelTurn>>,
        pub seen_messages: Mutex<Vec<Vec<ChatCompletionRequestMessage>>>,
        pub seen_tools: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedModel {
        pub fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                seen_messages: Mutex::new(Vec::new()),
                seen_tools: Mutex::new(Vec::new()),
            }
        }
    }

    /// Shorthand for a single tool call.
    pub fn call(id: &str, name: &str, query: &str) -> ToolInvocation {
        ToolInvocation {
            id: id.to_string(),
            name: name.to_string(),
            arguments: serde_json::json!({ "query": query }).to_string(),
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            messages: &[ChatCompletionRequestMessage],
            tools: &[ChatCompletionTool],
        ) -> Result<ModelTurn> {
            self.seen_messages.lock().unwrap().push(messages.to_vec());
            self.seen_tools
                .lock()
                .unwrap()
                .push(tools.iter().map(|t| t.function.name.clone()).collect());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| HjelperError::OpenAI("script exhausted".to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }
}
