//! Configuration settings for Hjelper.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub search: SearchSettings,
    pub csv: CsvSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary upload copies.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.hjelper".to_string(),
            temp_dir: "/tmp/hjelper".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Language model settings for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used by the agent.
    pub model: String,
    /// Maximum model calls per turn.
    pub max_iterations: usize,
    /// Log every agent step.
    pub verbose: bool,
    /// Pass the session transcript into the chat-history slot of the prompt.
    pub include_history: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_iterations: 15,
            verbose: true,
            include_history: false,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Text chunking settings for uploaded PDFs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// PDF retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks returned per query.
    pub k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 4 }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Search API endpoint.
    pub endpoint: String,
    /// Maximum results per query.
    pub max_results: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.tavily.com/search".to_string(),
            max_results: 6,
            timeout_secs: 30,
        }
    }
}

/// CSV code execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvSettings {
    /// Python interpreter used to run model-generated code.
    pub python: String,
    /// Variable name the DataFrame is bound to.
    pub variable_name: String,
    /// Execution timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            variable_name: "df".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Web UI server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Maximum request body size in megabytes (uploads).
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_mb: 200,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        let mut variables = std::collections::HashMap::new();
        variables.insert("organization".to_string(), "KEPCO KDN".to_string());
        Self {
            custom_dir: None,
            variables,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check values that would otherwise fail deep inside a turn.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::HjelperError;

        if self.chunking.chunk_size == 0 {
            return Err(HjelperError::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap > self.chunking.chunk_size {
            return Err(HjelperError::Config(format!(
                "chunking.chunk_overlap ({}) is larger than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.k == 0 {
            return Err(HjelperError::Config("retrieval.k must be positive".to_string()));
        }
        if self.llm.max_iterations == 0 {
            return Err(HjelperError::Config("llm.max_iterations must be positive".to_string()));
        }
        if self.csv.variable_name.is_empty()
            || !self
                .csv
                .variable_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            || self.csv.variable_name.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(HjelperError::Config(format!(
                "csv.variable_name '{}' is not a valid Python identifier",
                self.csv.variable_name
            )));
        }
        url::Url::parse(&self.search.endpoint).map_err(|e| {
            HjelperError::Config(format!("search.endpoint '{}': {}", self.search.endpoint, e))
        })?;
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::HjelperError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hjelper")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_pipeline() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.search.max_results, 6);
        assert_eq!(settings.csv.variable_name, "df");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_temperature_is_not_configurable() {
        // A stray key from older configs is ignored rather than applied
        let settings: Settings = toml::from_str("[llm]\ntemperature = 0.9\n").unwrap();
        assert!(settings.validate().is_ok());

        let saved = toml::to_string_pretty(&settings).unwrap();
        assert!(!saved.contains("temperature"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str("[llm]\nmodel = \"gpt-4o\"\n").unwrap();
        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.llm.max_iterations, 15);
        assert_eq!(settings.retrieval.k, 4);
    }

    #[test]
    fn test_overlap_larger_than_chunk_rejected() {
        let mut settings = Settings::default();
        settings.chunking.chunk_overlap = 2000;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_variable_name_rejected() {
        let mut settings = Settings::default();
        settings.csv.variable_name = "1df".to_string();
        assert!(settings.validate().is_err());

        settings.csv.variable_name = "my-df".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 8501);
    }
}
