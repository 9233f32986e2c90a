//! Process-wide session state.
//!
//! `SessionStore` is the single source of truth for "who is logged in".
//! Only this type mutates session fields; every other component consumes
//! immutable [`SessionSnapshot`]s.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use supplierdesk_auth::{DecodeError, Identity, decode};

use crate::clock::Clock;
use crate::storage::{PersistedSession, SessionStorage};

/// Immutable view of the session for read-only consumers.
///
/// Invariant: `identity` is present iff `credential` is present and was
/// successfully decoded. Absence of either means "logged out".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub credential: Option<String>,
    pub identity: Option<Identity>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    credential: Option<String>,
    identity: Option<Identity>,
    last_activity_at: Option<DateTime<Utc>>,
}

/// Owns the session lifecycle: created empty at process start, populated on
/// login or on rehydration from durable storage, cleared on logout.
///
/// `login` and `logout` are atomic with respect to observers: all three
/// fields change under one write lock, so no snapshot ever sees a
/// credential without its identity or vice versa.
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Create an empty (logged-out) store. Call [`SessionStore::restore`]
    /// afterwards to rehydrate any persisted session.
    pub fn new(storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            storage,
            clock,
        }
    }

    /// Rehydrate from durable storage, once, at startup.
    ///
    /// A persisted credential that no longer decodes, or whose expiry has
    /// already passed, is discarded together with its activity timestamp —
    /// the backend would reject it on the first poll anyway.
    pub async fn restore(&self) -> anyhow::Result<()> {
        let persisted = self.storage.load()?;
        let Some(credential) = persisted.credential else {
            return Ok(());
        };

        let now = self.clock.now();
        match decode(&credential) {
            Ok(identity) if !identity.is_expired(now) => {
                let mut state = self.state.write().await;
                state.credential = Some(credential);
                state.last_activity_at = Some(persisted.last_activity_at.unwrap_or(now));
                tracing::info!(subject = %identity.subject, "session restored from storage");
                state.identity = Some(identity);
                Ok(())
            }
            Ok(_) => {
                tracing::info!("persisted credential has expired, discarding");
                self.storage.clear()?;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "persisted credential no longer decodes, discarding");
                self.storage.clear()?;
                Ok(())
            }
        }
    }

    /// Decode and install a credential.
    ///
    /// On decode failure the store behaves as [`SessionStore::logout`] and
    /// returns the error to the caller.
    pub async fn login(&self, credential: impl Into<String>) -> Result<Identity, DecodeError> {
        let credential = credential.into();
        match decode(&credential) {
            Ok(identity) => {
                let now = self.clock.now();
                {
                    let mut state = self.state.write().await;
                    state.credential = Some(credential.clone());
                    state.identity = Some(identity.clone());
                    state.last_activity_at = Some(now);
                }

                let persisted = PersistedSession {
                    credential: Some(credential),
                    last_activity_at: Some(now),
                };
                if let Err(err) = self.storage.save(&persisted) {
                    tracing::warn!(error = %err, "failed to persist session");
                }

                tracing::info!(subject = %identity.subject, role = %identity.role, "session established");
                Ok(identity)
            }
            Err(err) => {
                self.logout().await;
                Err(err)
            }
        }
    }

    /// Record a qualifying interaction (or successful authenticated call).
    /// No-op when logged out.
    pub async fn touch_activity(&self) {
        let persisted = {
            let mut state = self.state.write().await;
            if state.credential.is_none() {
                return;
            }
            let now = self.clock.now();
            state.last_activity_at = Some(now);
            PersistedSession {
                credential: state.credential.clone(),
                last_activity_at: Some(now),
            }
        };

        if let Err(err) = self.storage.save(&persisted) {
            tracing::warn!(error = %err, "failed to persist activity timestamp");
        }
    }

    /// Clear the session in memory and in durable storage. Idempotent, so
    /// an inactivity-triggered logout and a 401-triggered one commute:
    /// whichever fires first wins and the second is a no-op.
    pub async fn logout(&self) {
        let was_logged_in = {
            let mut state = self.state.write().await;
            let was = state.identity.is_some();
            *state = SessionState::default();
            was
        };

        if let Err(err) = self.storage.clear() {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }

        if was_logged_in {
            tracing::info!("session cleared");
        }
    }

    /// Immutable snapshot for read-only consultation.
    pub async fn current(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            credential: state.credential.clone(),
            identity: state.identity.clone(),
            last_activity_at: state.last_activity_at,
        }
    }
}
