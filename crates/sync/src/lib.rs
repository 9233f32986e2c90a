//! `supplierdesk-sync` — polling synchronization against the backend.
//!
//! Keeps a local mirror of server-held supplier and user records fresh via
//! periodic full-collection fetches, and exposes an optimistic
//! mutate-with-rollback primitive for status changes. The server snapshot
//! is always authoritative; a 401 from any authenticated call clears the
//! session instead of propagating an error.

pub mod api;
pub mod engine;
pub mod error;
pub mod users;

pub use api::{ApiError, HttpApi, SupplierApi, UserChanges};
pub use engine::{POLL_FAILURE_LIMIT, POLL_INTERVAL, SyncEngine};
pub use error::SyncError;
pub use users::UserDirectory;
