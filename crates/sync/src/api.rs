//! Backend REST surface.
//!
//! The engine talks to the backend through the [`SupplierApi`] trait so
//! tests can run it against an in-memory fake; [`HttpApi`] is the reqwest
//! implementation used in production.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use supplierdesk_core::{SupplierId, SupplierRecord, SupplierStatus, UserId, UserRecord};

/// Failure of an authenticated backend call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401: the credential is invalid or expired. Authoritative — the
    /// caller must clear the session.
    #[error("credential rejected by the backend")]
    Unauthorized,

    /// Non-success status other than 401 (403 on insufficient role, 5xx, ...).
    #[error("backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Parse(String),
}

/// Fields an admin may change on a dashboard account, plus the
/// re-authentication factor the backend demands for sensitive changes.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Current admin password, echoed back to the server as a
    /// re-authentication factor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

/// The slice of the backend the sync layer consumes.
#[async_trait]
pub trait SupplierApi: Send + Sync {
    async fn fetch_suppliers(&self, credential: &str) -> Result<Vec<SupplierRecord>, ApiError>;

    async fn patch_supplier_status(
        &self,
        credential: &str,
        id: &SupplierId,
        status: SupplierStatus,
    ) -> Result<(), ApiError>;

    async fn fetch_users(&self, credential: &str) -> Result<Vec<UserRecord>, ApiError>;

    async fn patch_user(
        &self,
        credential: &str,
        id: &UserId,
        changes: &UserChanges,
    ) -> Result<(), ApiError>;
}

/// reqwest-backed backend client.
pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Map a response's status to the error taxonomy before the body is
    /// interpreted.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl SupplierApi for HttpApi {
    async fn fetch_suppliers(&self, credential: &str) -> Result<Vec<SupplierRecord>, ApiError> {
        let url = format!("{}/api/suppliers", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn patch_supplier_status(
        &self,
        credential: &str,
        id: &SupplierId,
        status: SupplierStatus,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/suppliers/{}/status", self.base_url, id);
        let resp = self
            .http
            .patch(&url)
            .bearer_auth(credential)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check(resp).await.map(|_| ())
    }

    async fn fetch_users(&self, credential: &str) -> Result<Vec<UserRecord>, ApiError> {
        let url = format!("{}/api/users", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn patch_user(
        &self,
        credential: &str,
        id: &UserId,
        changes: &UserChanges,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/users/{}", self.base_url, id);
        let resp = self
            .http
            .patch(&url)
            .bearer_auth(credential)
            .json(changes)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check(resp).await.map(|_| ())
    }
}
