//! `supplierdesk-session` — session lifecycle and inactivity tracking.
//!
//! The [`SessionStore`] is the single source of truth for "who is logged
//! in"; the [`ActivityMonitor`] evaluates the idle policy against it on a
//! timer. Both take their clock and durable storage by injection so tests
//! never wait on real timers or touch the real data directory.

pub mod clock;
pub mod monitor;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use monitor::{ActivityMonitor, IDLE_TIMEOUT, InputEvent, MonitorGuard, TICK_INTERVAL};
pub use storage::{FileStorage, MemoryStorage, PersistedSession, SessionStorage};
pub use store::{SessionSnapshot, SessionStore};
