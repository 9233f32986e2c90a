//! Inactivity tracking and forced logout.
//!
//! A recurring tick evaluates the idle policy against the session store;
//! qualifying input events forwarded by the UI shell refresh the activity
//! timestamp. The tick loop is owned by an RAII guard so listeners can
//! never leak across logout/login cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::store::SessionStore;

/// No qualifying input for longer than this clears the session.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default cadence of idle-policy evaluation.
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// A qualifying user interaction, as forwarded by the UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerMove,
    KeyPress,
    Click,
}

/// Evaluates the inactivity policy against a [`SessionStore`].
pub struct ActivityMonitor {
    session: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
}

impl ActivityMonitor {
    pub fn new(session: Arc<SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_timeout(session, clock, IDLE_TIMEOUT)
    }

    pub fn with_timeout(
        session: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            session,
            clock,
            idle_timeout,
        }
    }

    /// Forward one qualifying input event. Unconditional: debouncing is an
    /// efficiency concern for the shell, not a correctness one here.
    pub async fn record_input(&self, event: InputEvent) {
        tracing::trace!(?event, "qualifying input event");
        self.session.touch_activity().await;
    }

    /// One idle-policy evaluation (a single timer tick).
    ///
    /// Returns `true` when this evaluation cleared the session. With no
    /// session present there is nothing to expire and the tick is a no-op.
    pub async fn evaluate(&self) -> bool {
        let snapshot = self.session.current().await;
        let Some(last_activity) = snapshot.last_activity_at else {
            return false;
        };

        let idle = self
            .clock
            .now()
            .signed_duration_since(last_activity)
            .to_std()
            .unwrap_or_default();

        if idle > self.idle_timeout {
            tracing::info!(
                idle_secs = idle.as_secs(),
                "inactivity threshold exceeded, clearing session"
            );
            self.session.logout().await;
            true
        } else {
            false
        }
    }

    /// Start the recurring evaluation loop.
    ///
    /// Installed once at session-bearing-page mount; the returned guard owns
    /// the loop and stops it on [`MonitorGuard::shutdown`] or drop, so no
    /// callback survives an unmount.
    pub fn start(self: Arc<Self>, tick: Duration) -> MonitorGuard {
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn({
            let shutdown = Arc::clone(&shutdown);
            let monitor = self;
            async move {
                let mut interval = tokio::time::interval(tick);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                // The first tick of a tokio interval fires immediately;
                // the policy wants a full period before the first check.
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = shutdown.notified() => break,
                        _ = interval.tick() => {
                            monitor.evaluate().await;
                        }
                    }
                }
            }
        });

        MonitorGuard { shutdown, handle }
    }
}

/// Scoped ownership of the monitor loop; dropping it tears the loop down.
pub struct MonitorGuard {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl MonitorGuard {
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        self.shutdown.notify_one();
        self.handle.abort();
    }
}
