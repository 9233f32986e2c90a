use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplierdesk_core::Role;

/// Decoded, trusted-on-read identity claims from a bearer credential.
///
/// Derived state: recomputed every time a new credential is stored, never
/// mutated independently. The claims are *inspected*, not verified — the
/// backend's later 401 is the authoritative rejection of a bad credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject claim (`sub`) — the account's login name.
    pub subject: String,

    /// Access tier granted by the backend at issuance.
    pub role: Role,

    /// Issued-at timestamp (`iat`).
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp (`exp`).
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    /// Strict comparison: at the instant of `expires_at` itself the
    /// credential is still considered valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
