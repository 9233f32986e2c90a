//! Admin-only mirror of the user directory.

use std::sync::Arc;

use tokio::sync::RwLock;

use supplierdesk_auth::{Action, AuthzError, authorize};
use supplierdesk_core::{UserId, UserRecord};
use supplierdesk_session::SessionStore;

use crate::api::{ApiError, SupplierApi, UserChanges};
use crate::error::SyncError;

/// On-demand mirror of backend user accounts.
///
/// Unlike the supplier mirror this is not polled; admin screens refresh it
/// explicitly, and every edit re-fetches so the mirror reflects whatever
/// the server actually applied.
pub struct UserDirectory<A> {
    api: Arc<A>,
    session: Arc<SessionStore>,
    users: RwLock<Vec<UserRecord>>,
}

impl<A: SupplierApi> UserDirectory<A> {
    pub fn new(api: Arc<A>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            users: RwLock::new(Vec::new()),
        }
    }

    pub async fn users(&self) -> Vec<UserRecord> {
        self.users.read().await.clone()
    }

    /// Replace the mirror with the server's current account list.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        let snapshot = self.session.current().await;
        authorize(snapshot.identity.as_ref(), Action::ManageUsers)?;
        let credential = snapshot.credential.ok_or(AuthzError::LoginRequired)?;

        match self.api.fetch_users(&credential).await {
            Ok(users) => {
                tracing::debug!(count = users.len(), "user directory refreshed");
                *self.users.write().await = users;
                self.session.touch_activity().await;
                Ok(())
            }
            Err(ApiError::Unauthorized) => {
                tracing::warn!("user fetch rejected with 401, clearing session");
                self.session.logout().await;
                Ok(())
            }
            Err(err) => Err(SyncError::Api(err)),
        }
    }

    /// Apply account changes, then re-fetch the directory.
    ///
    /// A password change carries the acting admin's own password in
    /// `changes.admin_password`; the server re-verifies it before applying.
    pub async fn update_user(&self, id: &UserId, changes: UserChanges) -> Result<(), SyncError> {
        let snapshot = self.session.current().await;
        authorize(snapshot.identity.as_ref(), Action::ManageUsers)?;
        let credential = snapshot.credential.ok_or(AuthzError::LoginRequired)?;

        match self.api.patch_user(&credential, id, &changes).await {
            Ok(()) => {
                self.session.touch_activity().await;
                self.refresh().await
            }
            Err(ApiError::Unauthorized) => {
                tracing::warn!(user = %id, "user update rejected with 401, clearing session");
                self.session.logout().await;
                Ok(())
            }
            Err(err) => Err(SyncError::Api(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    use supplierdesk_core::{Role, SupplierId, SupplierRecord, SupplierStatus};
    use supplierdesk_session::{ManualClock, MemoryStorage};

    fn mint(role: &str) -> String {
        let iat = 1_700_000_000i64;
        let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256"}).to_string());
        let payload = URL_SAFE_NO_PAD.encode(
            json!({ "sub": "root", "role": role, "iat": iat, "exp": iat + 86_400 }).to_string(),
        );
        format!("{}.{}.sig", header, payload)
    }

    fn account(id: &str, role: Role) -> UserRecord {
        UserRecord {
            id: UserId::from(id),
            username: format!("user-{id}"),
            role,
        }
    }

    #[derive(Default)]
    struct FakeApi {
        users: Mutex<Vec<UserRecord>>,
        fetch_error: Mutex<Option<ApiError>>,
        patch_error: Mutex<Option<ApiError>>,
        fetch_calls: AtomicUsize,
        patches: Mutex<Vec<(UserId, UserChanges)>>,
    }

    #[async_trait::async_trait]
    impl SupplierApi for FakeApi {
        async fn fetch_suppliers(&self, _credential: &str) -> Result<Vec<SupplierRecord>, ApiError> {
            Ok(Vec::new())
        }

        async fn patch_supplier_status(
            &self,
            _credential: &str,
            _id: &SupplierId,
            _status: SupplierStatus,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn fetch_users(&self, _credential: &str) -> Result<Vec<UserRecord>, ApiError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.fetch_error.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(self.users.lock().unwrap().clone())
        }

        async fn patch_user(
            &self,
            _credential: &str,
            id: &UserId,
            changes: &UserChanges,
        ) -> Result<(), ApiError> {
            if let Some(err) = self.patch_error.lock().unwrap().clone() {
                return Err(err);
            }
            self.patches.lock().unwrap().push((id.clone(), changes.clone()));
            if let Some(name) = &changes.username {
                let mut users = self.users.lock().unwrap();
                if let Some(user) = users.iter_mut().find(|u| u.id == *id) {
                    user.username = name.clone();
                }
            }
            Ok(())
        }
    }

    async fn session_as(role: &str) -> Arc<SessionStore> {
        let session = Arc::new(SessionStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::at(
                chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            )),
        ));
        session.login(mint(role)).await.unwrap();
        session
    }

    #[tokio::test]
    async fn refresh_mirrors_the_server_list() {
        let session = session_as("admin").await;
        let api = Arc::new(FakeApi::default());
        *api.users.lock().unwrap() = vec![account("u1", Role::Member), account("u2", Role::Admin)];
        let directory = UserDirectory::new(Arc::clone(&api), session);

        directory.refresh().await.unwrap();
        let users = directory.users().await;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "user-u1");
    }

    #[tokio::test]
    async fn members_cannot_read_the_directory() {
        let session = session_as("member").await;
        let api = Arc::new(FakeApi::default());
        let directory = UserDirectory::new(Arc::clone(&api), session);

        let err = directory.refresh().await.unwrap_err();
        assert_eq!(err, SyncError::Denied(AuthzError::Forbidden("users.manage")));
        assert_eq!(api.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn update_patches_then_refetches() {
        let session = session_as("admin").await;
        let api = Arc::new(FakeApi::default());
        *api.users.lock().unwrap() = vec![account("u1", Role::Member)];
        let directory = UserDirectory::new(Arc::clone(&api), session);
        directory.refresh().await.unwrap();

        let changes = UserChanges {
            username: Some("renamed".to_string()),
            ..UserChanges::default()
        };
        directory.update_user(&UserId::from("u1"), changes).await.unwrap();

        assert_eq!(api.fetch_calls.load(Ordering::SeqCst), 2);
        assert_eq!(directory.users().await[0].username, "renamed");
    }

    #[tokio::test]
    async fn update_401_clears_the_session() {
        let session = session_as("admin").await;
        let api = Arc::new(FakeApi::default());
        *api.patch_error.lock().unwrap() = Some(ApiError::Unauthorized);
        let directory = UserDirectory::new(api, Arc::clone(&session));

        directory
            .update_user(&UserId::from("u1"), UserChanges::default())
            .await
            .unwrap();
        assert!(!session.current().await.is_logged_in());
    }

    #[tokio::test]
    async fn transient_update_failure_surfaces() {
        let session = session_as("admin").await;
        let api = Arc::new(FakeApi::default());
        *api.patch_error.lock().unwrap() =
            Some(ApiError::Api { status: 400, message: "Invalid admin password".to_string() });
        let directory = UserDirectory::new(api, Arc::clone(&session));

        let err = directory
            .update_user(&UserId::from("u1"), UserChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Api(ApiError::Api { status: 400, .. })));
        assert!(session.current().await.is_logged_in());
    }
}
