//! Polling synchronization of the supplier mirror, with optimistic status
//! mutation and rollback.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use supplierdesk_auth::{Action, AuthzError, authorize};
use supplierdesk_core::{SupplierId, SupplierRecord, SupplierStatus};
use supplierdesk_session::SessionStore;

use crate::api::{ApiError, SupplierApi};
use crate::error::SyncError;

/// Consecutive poll failures tolerated before the engine assumes the
/// credential is dead and clears the session. Persistent failure most
/// likely means an expired/revoked credential, not a flaky network.
pub const POLL_FAILURE_LIMIT: u32 = 3;

/// Default poll cadence, matching the production dashboard.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct CollectionState {
    /// Fetch-ordered mirror, unique by id, replaced wholesale per poll.
    records: Vec<SupplierRecord>,

    /// Records with an optimistic write awaiting server acknowledgement,
    /// tagged with the pre-mutation status for rollback. Absent key means
    /// the record is clean.
    pending: HashMap<SupplierId, SupplierStatus>,

    /// Monotone count of successful fetch replacements.
    fetch_seq: u64,
}

/// Keeps the supplier mirror fresh and mediates every status mutation.
///
/// Only this engine mutates the collection; everything else consumes
/// snapshots. Cancellation uses a generation counter: stop/restart bumps
/// it, and any in-flight fetch whose generation no longer matches discards
/// its result instead of applying it.
pub struct SyncEngine<A> {
    api: Arc<A>,
    session: Arc<SessionStore>,
    state: RwLock<CollectionState>,
    generation: AtomicU64,
    in_flight: AtomicBool,
    consecutive_failures: AtomicU32,
    shutdown: Notify,
}

impl<A: SupplierApi + 'static> SyncEngine<A> {
    pub fn new(api: Arc<A>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            state: RwLock::new(CollectionState::default()),
            generation: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
            shutdown: Notify::new(),
        }
    }

    /// Snapshot of the mirrored collection in fetch order.
    pub async fn suppliers(&self) -> Vec<SupplierRecord> {
        self.state.read().await.records.clone()
    }

    pub async fn supplier(&self, id: &SupplierId) -> Option<SupplierRecord> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| r.id == *id)
            .cloned()
    }

    /// How many successful fetches have replaced the mirror so far.
    pub async fn fetch_seq(&self) -> u64 {
        self.state.read().await.fetch_seq
    }

    /// Begin recurring polls.
    ///
    /// The first tick fires immediately, giving a fresh mirror right after
    /// login. Restarting bumps the generation so results from a previous
    /// incarnation can never replace the cache out of order.
    pub fn start_polling(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            tracing::info!(interval_secs = interval.as_secs(), "supplier polling started");
            let generation = engine.generation.load(Ordering::SeqCst);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = engine.shutdown.notified() => {}
                    _ = ticker.tick() => engine.poll_for_generation(generation).await,
                }
                if engine.generation.load(Ordering::SeqCst) != generation {
                    break;
                }
            }
            tracing::info!("supplier polling stopped");
        })
    }

    /// Stop the recurring poll. An in-flight fetch is allowed to complete
    /// but its result is discarded.
    pub fn stop_polling(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    /// One poll cycle: a single authenticated full-collection fetch.
    ///
    /// Skipped when logged out, and when a previous fetch is still in
    /// flight (at most one outstanding fetch, so replacements stay in
    /// order and concurrent requests stay bounded).
    pub async fn poll_once(&self) {
        self.poll_for_generation(self.generation.load(Ordering::SeqCst))
            .await;
    }

    /// A poll issued under a specific generation. A no-op once the
    /// generation has moved on, so a tick that was already due when
    /// [`SyncEngine::stop_polling`] fired never reaches the network.
    async fn poll_for_generation(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("skipping poll issued under a stale generation");
            return;
        }

        let snapshot = self.session.current().await;
        let Some(credential) = snapshot.credential else {
            return;
        };

        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("previous poll still in flight, skipping tick");
            return;
        }

        let result = self.api.fetch_suppliers(&credential).await;
        self.in_flight.store(false, Ordering::SeqCst);

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("discarding poll result from a stopped engine");
            return;
        }

        match result {
            Ok(records) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                {
                    let mut state = self.state.write().await;
                    tracing::debug!(count = records.len(), "supplier mirror replaced");
                    state.records = records;
                    // The server snapshot is authoritative: unacknowledged
                    // optimistic writes do not survive it.
                    state.pending.clear();
                    state.fetch_seq += 1;
                }
                // A successful authenticated call counts as activity.
                self.session.touch_activity().await;
            }
            Err(ApiError::Unauthorized) => {
                tracing::warn!("poll rejected with 401, clearing session");
                self.session.logout().await;
            }
            Err(err) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::warn!(error = %err, failures, "poll failed, keeping stale mirror");
                if failures >= POLL_FAILURE_LIMIT {
                    tracing::warn!(
                        limit = POLL_FAILURE_LIMIT,
                        "persistent poll failure, treating credential as dead"
                    );
                    self.consecutive_failures.store(0, Ordering::SeqCst);
                    self.session.logout().await;
                }
            }
        }
    }

    /// Optimistically set a supplier's status and issue the PATCH.
    ///
    /// Requires the admin role; the gate runs before any network call.
    /// Outcomes:
    /// - PATCH success: the local value stands, the next poll confirms it.
    /// - 401: the local optimistic value stays (the forced navigation will
    ///   discard the view) and the session is cleared.
    /// - any other failure: the record rolls back to its pre-mutation
    ///   status and the error is surfaced.
    pub async fn mutate_status(
        &self,
        id: &SupplierId,
        new_status: SupplierStatus,
    ) -> Result<(), SyncError> {
        let snapshot = self.session.current().await;
        authorize(snapshot.identity.as_ref(), Action::MutateSupplierStatus)?;
        let credential = snapshot.credential.ok_or(AuthzError::LoginRequired)?;

        {
            let mut state = self.state.write().await;
            let Some(record) = state.records.iter_mut().find(|r| r.id == *id) else {
                return Err(SyncError::UnknownRecord(id.clone()));
            };
            let previous = record.status;
            record.status = new_status;
            // A record with an earlier mutation still pending keeps its
            // original tag, so a rollback always restores the last
            // server-acknowledged status.
            state.pending.entry(id.clone()).or_insert(previous);
        }

        tracing::debug!(supplier = %id, status = %new_status, "optimistic status write");

        match self
            .api
            .patch_supplier_status(&credential, id, new_status)
            .await
        {
            Ok(()) => {
                self.state.write().await.pending.remove(id);
                self.session.touch_activity().await;
                Ok(())
            }
            Err(ApiError::Unauthorized) => {
                self.state.write().await.pending.remove(id);
                tracing::warn!(supplier = %id, "status mutation rejected with 401, clearing session");
                self.session.logout().await;
                Ok(())
            }
            Err(err) => {
                let mut state = self.state.write().await;
                if let Some(previous) = state.pending.remove(id) {
                    if let Some(record) = state.records.iter_mut().find(|r| r.id == *id) {
                        tracing::warn!(
                            supplier = %id,
                            error = %err,
                            rollback = %previous,
                            "status mutation failed, rolling back"
                        );
                        record.status = previous;
                    }
                }
                Err(SyncError::Api(err))
            }
        }
    }
}
