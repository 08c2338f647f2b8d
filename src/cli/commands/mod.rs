//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::{router, run_serve, AppState};

use crate::cli::{KeyArgs, UploadArgs};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::session::{Credentials, Session, Uploads};
use std::sync::Arc;

/// Load prompts with the overrides named in the settings.
pub fn load_prompts(settings: &Settings) -> Result<Arc<Prompts>> {
    Ok(Arc::new(Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?))
}

/// Open a terminal session with the given keys and files.
fn open_session(settings: Settings, keys: &KeyArgs, uploads: &UploadArgs) -> Result<Session> {
    let prompts = load_prompts(&settings)?;
    let mut session = Session::new(Arc::new(settings), prompts);
    session.set_credentials(Credentials::from(keys));
    session.set_uploads(Uploads::from_paths(&uploads.pdfs, uploads.csv.as_ref())?);
    Ok(session)
}

impl From<&KeyArgs> for Credentials {
    fn from(keys: &KeyArgs) -> Self {
        Credentials::new(keys.openai_api_key.trim(), keys.tavily_api_key.trim())
    }
}
