//! Error surface of the sync operations.

use thiserror::Error;

use supplierdesk_auth::AuthzError;
use supplierdesk_core::SupplierId;

use crate::api::ApiError;

/// Errors surfaced to callers of sync operations.
///
/// Credential-invalidating failures (401) never appear here: they are
/// handled inside the engine by forcing logout, and the caller observes
/// the cleared session instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Local gate rejection; no network call was issued.
    #[error(transparent)]
    Denied(#[from] AuthzError),

    /// The targeted record is not in the local mirror.
    #[error("unknown record: {0}")]
    UnknownRecord(SupplierId),

    /// Transient backend failure; any optimistic write was rolled back.
    #[error(transparent)]
    Api(#[from] ApiError),
}
