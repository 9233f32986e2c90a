//! `supplierdesk-core` — domain records shared across the client core.
//!
//! This crate contains **pure data** mirrored from the backend (no
//! infrastructure concerns). The authoritative copies live server-side;
//! everything here is a locally cached, possibly stale view.

pub mod role;
pub mod supplier;
pub mod user;

pub use role::Role;
pub use supplier::{Address, SupplierId, SupplierRecord, SupplierStatus};
pub use user::{UserId, UserRecord};
