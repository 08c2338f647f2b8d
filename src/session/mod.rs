//! Per-user chat session state.
//!
//! A session owns the credentials, the current uploads, the transcript and
//! the tools derived from the uploads. Tools are cached by the content hash
//! of their uploads and rebuilt only when the uploads change; the agent
//! itself is rebuilt on every turn.

mod services;
mod store;
mod transcript;

pub use services::{DefaultServices, Services};
pub use store::SessionStore;
pub use transcript::{ChatMessage, Role, Transcript};

use crate::agent::{build_agent, run_turn, TurnResult};
use crate::chunking::{ChunkingConfig, RecursiveCharacterSplitter};
use crate::config::{Prompts, Settings};
use crate::error::{HjelperError, Result};
use crate::loader::{fingerprint_all, UploadedFile};
use crate::tools::{assemble_tools, CsvReplTool, PdfSearchTool, Tool, ToolSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Warning shown while either API key is missing.
pub const MISSING_CREDENTIALS_WARNING: &str = "API 키를 입력하세요.";

/// API keys supplied by the user.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub openai_api_key: String,
    pub tavily_api_key: String,
}

impl Credentials {
    /// Credentials from an OpenAI key and a Tavily key.
    pub fn new(openai_api_key: impl Into<String>, tavily_api_key: impl Into<String>) -> Self {
        Self {
            openai_api_key: openai_api_key.into(),
            tavily_api_key: tavily_api_key.into(),
        }
    }

    /// Both keys are present.
    pub fn is_complete(&self) -> bool {
        !self.openai_api_key.trim().is_empty() && !self.tavily_api_key.trim().is_empty()
    }

    /// Fail with the standard warning unless both keys are present.
    pub fn require(&self) -> Result<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(HjelperError::MissingCredentials(MISSING_CREDENTIALS_WARNING.to_string()))
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("tavily_api_key", &mask(&self.tavily_api_key))
            .finish()
    }
}

fn mask(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Files the user has uploaded to a session.
#[derive(Debug, Clone, Default)]
pub struct Uploads {
    pub pdfs: Vec<UploadedFile>,
    pub csv: Option<UploadedFile>,
}

impl Uploads {
    /// Read uploads from local paths.
    pub fn from_paths(pdfs: &[PathBuf], csv: Option<&PathBuf>) -> Result<Self> {
        Ok(Self {
            pdfs: pdfs.iter().map(|p| UploadedFile::from_path(p)).collect::<Result<_>>()?,
            csv: csv.map(|p| UploadedFile::from_path(p)).transpose()?,
        })
    }

    /// Whether neither a PDF nor a CSV is attached.
    pub fn is_empty(&self) -> bool {
        self.pdfs.is_empty() && self.csv.is_none()
    }
}

/// Summary of a session's current state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub credentials_ready: bool,
    pub pdfs: Vec<String>,
    pub csv: Option<String>,
    pub messages: usize,
}

/// A chat session.
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    settings: Arc<Settings>,
    prompts: Arc<Prompts>,
    services: Arc<dyn Services>,
    credentials: Credentials,
    uploads: Uploads,
    transcript: Transcript,
    pdf_tool: Option<Arc<PdfSearchTool>>,
    csv_tool: Option<Arc<CsvReplTool>>,
}

impl Session {
    /// Create a session talking to the default services.
    pub fn new(settings: Arc<Settings>, prompts: Arc<Prompts>) -> Self {
        Self::with_services(settings, prompts, Arc::new(DefaultServices))
    }

    /// Create a session with custom service factories.
    pub fn with_services(settings: Arc<Settings>, prompts: Arc<Prompts>, services: Arc<dyn Services>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            settings,
            prompts,
            services,
            credentials: Credentials::default(),
            uploads: Uploads::default(),
            transcript: Transcript::new(),
            pdf_tool: None,
            csv_tool: None,
        }
    }

    /// Session ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Replace the API keys.
    ///
    /// The cached PDF index embeds queries with the old key, so it is dropped
    /// when the keys change.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        if credentials != self.credentials {
            self.pdf_tool = None;
        }
        self.credentials = credentials;
    }

    /// Whether both API keys are set.
    pub fn credentials_ready(&self) -> bool {
        self.credentials.is_complete()
    }

    /// Replace the uploaded PDF set.
    pub fn set_pdfs(&mut self, pdfs: Vec<UploadedFile>) {
        self.uploads.pdfs = pdfs;
    }

    /// Replace the uploaded CSV. `None` removes it.
    pub fn set_csv(&mut self, csv: Option<UploadedFile>) {
        self.uploads.csv = csv;
    }

    /// Replace all uploads at once.
    pub fn set_uploads(&mut self, uploads: Uploads) {
        self.uploads = uploads;
    }

    /// Files attached to this session.
    pub fn uploads(&self) -> &Uploads {
        &self.uploads
    }

    /// Conversation so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Forget the conversation; uploads and keys stay.
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    /// Summary of the session state for display.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            created_at: self.created_at,
            credentials_ready: self.credentials.is_complete(),
            pdfs: self.uploads.pdfs.iter().map(|f| f.name.clone()).collect(),
            csv: self.uploads.csv.as_ref().map(|f| f.name.clone()),
            messages: self.transcript.len(),
        }
    }

    /// Assemble the tools for the current uploads.
    ///
    /// The PDF index and the CSV tool are reused while their uploads are
    /// unchanged.
    pub async fn tools(&mut self) -> Result<ToolSet> {
        self.credentials.require()?;

        let web_search = self.services.web_search(
            &self.credentials,
            &self.settings.search,
            &self.prompts.agent.web_search,
        )?;
        let pdf_search = self.pdf_tool().await?.map(|t| t as Arc<dyn Tool>);
        let csv_repl = self.csv_tool()?.map(|t| t as Arc<dyn Tool>);

        assemble_tools(web_search, pdf_search, csv_repl)
    }

    async fn pdf_tool(&mut self) -> Result<Option<Arc<PdfSearchTool>>> {
        if self.uploads.pdfs.is_empty() {
            self.pdf_tool = None;
            return Ok(None);
        }

        let fingerprint = fingerprint_all(&self.uploads.pdfs);
        if let Some(tool) = &self.pdf_tool {
            if tool.fingerprint() == fingerprint {
                return Ok(Some(tool.clone()));
            }
        }

        let embedder = self.services.embedder(&self.credentials, &self.settings.embedding)?;
        let splitter = RecursiveCharacterSplitter::new(ChunkingConfig::from(&self.settings.chunking))?;
        let tool = Arc::new(
            PdfSearchTool::from_uploads(
                &self.uploads.pdfs,
                embedder,
                &splitter,
                self.settings.retrieval.k,
                &self.prompts.agent.pdf_search,
                &self.settings.temp_dir(),
            )
            .await?,
        );

        self.pdf_tool = Some(tool.clone());
        Ok(Some(tool))
    }

    fn csv_tool(&mut self) -> Result<Option<Arc<CsvReplTool>>> {
        let Some(upload) = &self.uploads.csv else {
            self.csv_tool = None;
            return Ok(None);
        };

        if let Some(tool) = &self.csv_tool {
            if tool.fingerprint() == upload.fingerprint() {
                return Ok(Some(tool.clone()));
            }
        }

        let variable = &self.settings.csv.variable_name;
        let tool = Arc::new(CsvReplTool::new(
            upload,
            &self.settings.csv,
            &self.prompts.csv_repl_description(variable),
            &self.settings.temp_dir(),
        )?);

        self.csv_tool = Some(tool.clone());
        Ok(Some(tool))
    }

    /// Answer one question and record the exchange.
    ///
    /// The transcript is only touched when the turn succeeds.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn ask(&mut self, question: &str) -> Result<TurnResult> {
        self.credentials.require()?;

        let question = question.trim();
        if question.is_empty() {
            return Err(HjelperError::InvalidInput("question is empty".to_string()));
        }

        let tools = self.tools().await?;
        info!("Tools for this turn: {:?}", tools.names());

        let model = self.services.chat_model(&self.credentials, &self.settings.llm)?;
        let agent = build_agent(
            model,
            &self.prompts,
            &self.settings.csv.variable_name,
            &self.settings.llm,
            tools,
        );

        let history: &[ChatMessage] = if self.settings.llm.include_history {
            self.transcript.messages()
        } else {
            &[]
        };
        let turn = run_turn(&agent, question, history).await?;

        self.transcript.record_exchange(question, &turn.reply);
        Ok(turn)
    }

    /// Release cached tools and their temporary files.
    pub fn close(mut self) {
        self.pdf_tool = None;
        self.csv_tool = None;
        info!("Closed session {}", self.id);
    }
}
