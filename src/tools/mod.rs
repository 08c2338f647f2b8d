//! Tools the agent can call.
//!
//! Each tool wraps one capability (web search, PDF retrieval, CSV code
//! execution) behind a name, a natural-language description the model reads
//! when choosing what to call, and a JSON argument schema.

mod csv_repl;
mod pdf_search;
mod web_search;

pub use csv_repl::{sanitize_code, CsvReplTool};
pub use pdf_search::PdfSearchTool;
pub use web_search::{WebSearchResult, WebSearchTool};

use crate::error::{HjelperError, Result};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use std::sync::Arc;

/// Name of the web search tool.
pub const WEB_SEARCH: &str = "web_search";
/// Name of the PDF retrieval tool.
pub const PDF_SEARCH: &str = "pdf_search";
/// Name of the CSV code execution tool.
pub const CSV_REPL: &str = "csv_repl";

/// A named capability the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> serde_json::Value {
        query_schema("The input query")
    }

    /// Run the tool with the model-supplied JSON arguments.
    async fn call(&self, arguments: &str) -> Result<String>;

    /// OpenAI function definition for this tool.
    fn definition(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: self.name().to_string(),
                description: Some(self.description().to_string()),
                parameters: Some(self.parameters()),
                strict: None,
            },
        }
    }
}

/// Schema for tools that take a single `query` string.
pub fn query_schema(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": description
            }
        },
        "required": ["query"]
    })
}

/// Extract the `query` argument from a tool call.
pub fn parse_query(arguments: &str) -> Result<String> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| HjelperError::Tool(format!("Invalid tool arguments: {}", e)))?;

    args["query"]
        .as_str()
        .map(|q| q.to_string())
        .ok_or_else(|| HjelperError::Tool("Missing 'query' argument".to_string()))
}

/// Ordered set of tools with unique names.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    /// Create an empty tool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Fails if a tool with the same name is already present.
    pub fn add(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        if self.get(tool.name()).is_some() {
            return Err(HjelperError::InvalidInput(format!(
                "Duplicate tool name: {}",
                tool.name()
            )));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Tool names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// OpenAI function definitions for every tool.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Assemble the tools for one turn.
///
/// Web search is always present; PDF retrieval and CSV execution are added
/// only when the corresponding upload exists.
pub fn assemble_tools(
    web_search: Arc<dyn Tool>,
    pdf_search: Option<Arc<dyn Tool>>,
    csv_repl: Option<Arc<dyn Tool>>,
) -> Result<ToolSet> {
    let mut tools = ToolSet::new();
    tools.add(web_search)?;
    if let Some(pdf) = pdf_search {
        tools.add(pdf)?;
    }
    if let Some(csv) = csv_repl {
        tools.add(csv)?;
    }
    Ok(tools)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Tool doubles shared by tests across the crate.

    use super::*;

    /// Returns a fixed observation for every call.
    pub struct StaticTool {
        pub name: String,
        pub observation: String,
    }

    impl StaticTool {
        pub fn new(name: &str, observation: &str) -> Arc<dyn Tool> {
            Arc::new(Self {
                name: name.to_string(),
                observation: observation.to_string(),
            })
        }
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "Returns a canned observation"
        }

        async fn call(&self, _arguments: &str) -> Result<String> {
            Ok(self.observation.clone())
        }
    }

    /// Always fails.
    pub struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            WEB_SEARCH
        }

        fn description(&self) -> &str {
            "Fails every call"
        }

        async fn call(&self, _arguments: &str) -> Result<String> {
            Err(HjelperError::Search("quota exceeded".to_string()))
        }
    }
}
