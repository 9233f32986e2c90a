//! Process configuration.

use std::time::Duration;

use supplierdesk_session::{IDLE_TIMEOUT, TICK_INTERVAL};
use supplierdesk_sync::POLL_INTERVAL;

/// Client-side settings.
///
/// The backend URL comes from the environment; the timing knobs default to
/// the library constants and exist so an embedding shell can tune them.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing path.
    pub api_url: String,
    /// Cadence of full-collection supplier fetches.
    pub poll_interval: Duration,
    /// Inactivity span after which the session is cleared.
    pub idle_timeout: Duration,
    /// Cadence of idle-policy evaluation.
    pub tick_interval: Duration,
}

impl ClientConfig {
    /// Read configuration from the environment, falling back to a local
    /// development backend.
    pub fn from_env() -> Self {
        let api_url = std::env::var("SUPPLIERDESK_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        Self {
            api_url,
            poll_interval: POLL_INTERVAL,
            idle_timeout: IDLE_TIMEOUT,
            tick_interval: TICK_INTERVAL,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
