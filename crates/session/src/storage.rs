//! Durable shadow copies of the session, re-read once at startup.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted slice of the session: the credential string and the
/// last-activity timestamp, under well-known keys. Absence of the
/// credential means "logged out" at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub credential: Option<String>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Durable home for the session shadow copies.
///
/// Implementations are consulted synchronously from the store's own
/// critical section; they should be fast and must never panic.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> anyhow::Result<PersistedSession>;
    fn save(&self, session: &PersistedSession) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

/// JSON-file-backed storage under the platform data directory
/// (e.g. `~/.local/share/supplierdesk/session.json`).
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at the platform default location.
    pub fn default_path() -> anyhow::Result<Self> {
        let dir = dirs::data_local_dir()
            .context("failed to determine data directory for session storage")?;
        Ok(Self::at(dir.join("supplierdesk").join("session.json")))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> anyhow::Result<PersistedSession> {
        if !self.path.exists() {
            return Ok(PersistedSession::default());
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file at {:?}", self.path))?;

        // A corrupt session file must not brick startup; it just means
        // "logged out".
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(session),
            Err(err) => {
                tracing::warn!(error = %err, path = ?self.path, "discarding corrupt session file");
                Ok(PersistedSession::default())
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session directory at {:?}", parent))?;
        }

        let raw = serde_json::to_string(session).context("failed to serialize session")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write session file at {:?}", self.path))
    }

    fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove session file at {:?}", self.path))
            }
        }
    }
}

/// In-memory storage for tests and ephemeral embeddings.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<PersistedSession>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> anyhow::Result<PersistedSession> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, session: &PersistedSession) -> anyhow::Result<()> {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session.clone();
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.save(&PersistedSession::default())
    }
}
