//! Four-part agent prompt: system, chat history, input, scratchpad.

use crate::error::{HjelperError, Result};
use crate::session::{ChatMessage, Role};
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};

/// Prompt template for the tool-calling agent.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    /// Render the messages for one model call.
    ///
    /// `scratchpad` holds the tool calls and observations made so far in the
    /// current turn and always comes last.
    pub fn format(
        &self,
        history: &[ChatMessage],
        input: &str,
        scratchpad: &[ChatCompletionRequestMessage],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(history.len() + scratchpad.len() + 2);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system.clone())
                .build()
                .map_err(|e| HjelperError::Agent(e.to_string()))?
                .into(),
        );

        for message in history {
            messages.push(match message.role {
                Role::User => user_message(&message.content)?,
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| HjelperError::Agent(e.to_string()))?
                    .into(),
            });
        }

        messages.push(user_message(input)?);
        messages.extend(scratchpad.iter().cloned());

        Ok(messages)
    }
}

fn user_message(content: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| HjelperError::Agent(e.to_string()))?
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::ChatCompletionRequestToolMessageArgs;

    #[test]
    fn test_layout_without_history() {
        let prompt = PromptTemplate::new("system text");
        let messages = prompt.format(&[], "질문", &[]).unwrap();

        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_history_precedes_input_and_scratchpad_follows() {
        let prompt = PromptTemplate::new("system text");
        let history = vec![ChatMessage::user("earlier"), ChatMessage::assistant("answer")];
        let scratchpad: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id("call_1")
                .content("observation")
                .build()
                .unwrap()
                .into(),
        ];

        let messages = prompt.format(&history, "now", &scratchpad).unwrap();
        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[4], ChatCompletionRequestMessage::Tool(_)));
    }
}
