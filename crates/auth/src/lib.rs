//! `supplierdesk-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP, timers, and storage:
//! credential decoding and the role policy are deterministic functions the
//! session and sync layers consult.

pub mod claims;
pub mod codec;
pub mod gate;

pub use claims::Identity;
pub use codec::{DecodeError, decode};
pub use gate::{Action, AuthzError, authorize, can_perform};
