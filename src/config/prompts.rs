//! Prompt templates for Hjelper.
//!
//! The agent system prompt and the tool descriptions can be customized by
//! placing an `agent.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Organization named in the system prompt when config does not set one.
pub const DEFAULT_ORGANIZATION: &str = "KEPCO KDN";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts consumed by the tool-calling agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// System instructions, including the tool routing policy.
    pub system: String,
    /// Description of the `web_search` tool.
    pub web_search: String,
    /// Description of the `pdf_search` tool.
    pub pdf_search: String,
    /// Description of the `csv_repl` tool. `{{variable}}` is the DataFrame name.
    pub csv_repl: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant for {{organization}} employees. \
If the question mentions '데이터', always call `csv_repl`. \
If the answer is in the PDF, call `pdf_search`. \
Otherwise, call `web_search`. \
When using csv_repl, always execute Python code on the DataFrame `{{variable}}` \
and return the exact execution result in Korean."
                .to_string(),
            web_search: "A search engine optimized for comprehensive, accurate, and trusted results. \
Useful for when you need to answer questions about current events. \
Input should be a search query."
                .to_string(),
            pdf_search: "Search for information from the uploaded PDF files".to_string(),
            csv_repl: "Execute Python code to inspect and analyze the CSV data. \
DataFrame is available as variable `{{variable}}`."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    /// `organization` falls back to [`DEFAULT_ORGANIZATION`].
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        merged
            .entry("organization".to_string())
            .or_insert_with(|| DEFAULT_ORGANIZATION.to_string());
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// System prompt with the DataFrame variable name filled in.
    pub fn system_prompt(&self, variable: &str) -> String {
        self.render_with_custom(&self.agent.system, &variable_map(variable))
    }

    /// `csv_repl` description with the DataFrame variable name filled in.
    pub fn csv_repl_description(&self, variable: &str) -> String {
        self.render_with_custom(&self.agent.csv_repl, &variable_map(variable))
    }
}

fn variable_map(variable: &str) -> std::collections::HashMap<String, String> {
    let mut vars = std::collections::HashMap::new();
    vars.insert("variable".to_string(), variable.to_string());
    vars
}
