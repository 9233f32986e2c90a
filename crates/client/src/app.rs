//! The [`Dashboard`] facade: one object a UI shell drives.
//!
//! Owns the session store, the polling sync engine, the user directory and
//! the inactivity monitor, and ties their lifecycles together: login (or a
//! successful restore) mounts the background loops, logout unmounts them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use supplierdesk_auth::{Action, DecodeError, Identity, can_perform};
use supplierdesk_core::{SupplierId, SupplierRecord, SupplierStatus, UserId, UserRecord};
use supplierdesk_session::{
    ActivityMonitor, Clock, FileStorage, InputEvent, MonitorGuard, SessionSnapshot, SessionStorage,
    SessionStore, SystemClock,
};
use supplierdesk_sync::{
    HttpApi, SupplierApi, SyncEngine, SyncError, UserChanges, UserDirectory,
};

use crate::config::ClientConfig;

/// Background loops alive while a session-bearing view is mounted.
struct SessionGuards {
    poll: JoinHandle<()>,
    monitor: MonitorGuard,
}

/// Front door for the supplier review dashboard.
///
/// A forced logout (401, inactivity) only clears the session store; the
/// shell observes that through [`Dashboard::session`] and is expected to
/// navigate away and call [`Dashboard::logout`], which tears the loops
/// down. Until then the loops idle harmlessly against the empty session.
pub struct Dashboard<A = HttpApi> {
    session: Arc<SessionStore>,
    engine: Arc<SyncEngine<A>>,
    directory: UserDirectory<A>,
    monitor: Arc<ActivityMonitor>,
    guards: Mutex<Option<SessionGuards>>,
    poll_interval: Duration,
    tick_interval: Duration,
}

impl Dashboard {
    /// Production wiring: reqwest transport, on-disk session persistence,
    /// wall clock.
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::default_path()?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Ok(Self::assemble(
            Arc::new(HttpApi::new(config.api_url.clone())),
            storage,
            clock,
            config,
        ))
    }
}

impl<A: SupplierApi + 'static> Dashboard<A> {
    /// Assemble from explicit parts. Tests inject a fake transport, an
    /// in-memory store and a hand-advanced clock here.
    pub fn with_parts(
        api: Arc<A>,
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::assemble(api, storage, clock, &ClientConfig::from_env())
    }

    fn assemble(
        api: Arc<A>,
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
        config: &ClientConfig,
    ) -> Self {
        let session = Arc::new(SessionStore::new(storage, Arc::clone(&clock)));
        let engine = Arc::new(SyncEngine::new(Arc::clone(&api), Arc::clone(&session)));
        let directory = UserDirectory::new(Arc::clone(&api), Arc::clone(&session));
        let monitor = Arc::new(ActivityMonitor::with_timeout(
            Arc::clone(&session),
            clock,
            config.idle_timeout,
        ));
        Self {
            session,
            engine,
            directory,
            monitor,
            guards: Mutex::new(None),
            poll_interval: config.poll_interval,
            tick_interval: config.tick_interval,
        }
    }

    /// Rehydrate a persisted session. Returns whether a live session came
    /// back; when it did, the background loops are already running.
    pub async fn restore(&self) -> anyhow::Result<bool> {
        self.session.restore().await?;
        let live = self.session.current().await.is_logged_in();
        if live {
            self.mount();
        }
        Ok(live)
    }

    /// Accept a freshly issued credential and bring the dashboard up.
    pub async fn login(&self, credential: impl Into<String>) -> Result<Identity, DecodeError> {
        let identity = self.session.login(credential).await?;
        self.mount();
        Ok(identity)
    }

    /// Explicit sign-out: stop the background loops, then clear the session.
    pub async fn logout(&self) {
        self.unmount();
        self.session.logout().await;
    }

    pub async fn session(&self) -> SessionSnapshot {
        self.session.current().await
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.current().await.is_logged_in()
    }

    /// Whether the current session may perform `action`. Drives what the
    /// shell renders; the same gate runs again inside each operation.
    pub async fn can(&self, action: Action) -> bool {
        let snapshot = self.session.current().await;
        can_perform(snapshot.identity.as_ref(), action)
    }

    /// Forward a qualifying input event from the shell.
    pub async fn record_input(&self, event: InputEvent) {
        self.monitor.record_input(event).await;
    }

    pub async fn suppliers(&self) -> Vec<SupplierRecord> {
        self.engine.suppliers().await
    }

    pub async fn supplier(&self, id: &SupplierId) -> Option<SupplierRecord> {
        self.engine.supplier(id).await
    }

    /// Force a refresh outside the regular cadence (pull-to-refresh).
    pub async fn sync_now(&self) {
        self.engine.poll_once().await;
    }

    pub async fn set_supplier_status(
        &self,
        id: &SupplierId,
        status: SupplierStatus,
    ) -> Result<(), SyncError> {
        self.engine.mutate_status(id, status).await
    }

    pub async fn refresh_users(&self) -> Result<(), SyncError> {
        self.directory.refresh().await
    }

    pub async fn users(&self) -> Vec<UserRecord> {
        self.directory.users().await
    }

    pub async fn update_user(&self, id: &UserId, changes: UserChanges) -> Result<(), SyncError> {
        self.directory.update_user(id, changes).await
    }

    fn mount(&self) {
        let mut guards = self
            .guards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if guards.is_some() {
            return;
        }
        tracing::debug!("mounting background loops");
        *guards = Some(SessionGuards {
            poll: self.engine.start_polling(self.poll_interval),
            monitor: Arc::clone(&self.monitor).start(self.tick_interval),
        });
    }

    fn unmount(&self) {
        let taken = self
            .guards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(guards) = taken {
            tracing::debug!("unmounting background loops");
            self.engine.stop_polling();
            guards.monitor.shutdown();
            drop(guards.poll);
        }
    }
}

impl<A> Drop for Dashboard<A> {
    fn drop(&mut self) {
        if let Some(guards) = self
            .guards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            guards.poll.abort();
            drop(guards.monitor);
        }
    }
}
