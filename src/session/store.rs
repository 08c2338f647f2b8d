//! Process-wide registry of chat sessions for the web UI.

use super::{Services, Session};
use crate::config::{Prompts, Settings};
use crate::error::{HjelperError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// Sessions keyed by ID.
///
/// Each session sits behind its own mutex, so turns within one session run
/// one at a time while different sessions proceed independently.
pub struct SessionStore {
    settings: Arc<Settings>,
    prompts: Arc<Prompts>,
    services: Arc<dyn Services>,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    /// Create an empty store backed by the given services.
    pub fn new(settings: Arc<Settings>, prompts: Arc<Prompts>, services: Arc<dyn Services>) -> Self {
        Self {
            settings,
            prompts,
            services,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new session and return its ID.
    pub async fn create(&self) -> Uuid {
        let session = Session::with_services(
            self.settings.clone(),
            self.prompts.clone(),
            self.services.clone(),
        );
        let id = session.id();
        self.sessions.write().await.insert(id, Arc::new(Mutex::new(session)));
        info!("Opened session {}", id);
        id
    }

    /// Look up a session.
    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| HjelperError::SessionNotFound(id.to_string()))
    }

    /// Remove a session and release its resources.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| HjelperError::SessionNotFound(id.to_string()))?;

        // Wait for any in-flight turn before tearing down
        let session = session.lock_owned().await;
        drop(session);
        info!("Removed session {}", id);
        Ok(())
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are open.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{settings_in, TestServices};

    fn store(dir: &std::path::Path) -> SessionStore {
        SessionStore::new(settings_in(dir), Arc::new(Prompts::default()), TestServices::new(vec![], ""))
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let id = store.create().await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(id).await.unwrap().lock().await.id(), id);

        store.remove(id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(store.get(id).await, Err(HjelperError::SessionNotFound(_))));
        assert!(store.remove(id).await.is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let a = store.create().await;
        let b = store.create().await;
        assert_ne!(a, b);

        store
            .get(a)
            .await
            .unwrap()
            .lock()
            .await
            .set_credentials(crate::session::Credentials::new("sk", "tvly"));

        assert!(store.get(a).await.unwrap().lock().await.credentials_ready());
        assert!(!store.get(b).await.unwrap().lock().await.credentials_ready());
    }
}
