//! End-to-end dashboard scenarios against a fake transport.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;

use supplierdesk_auth::{Action, AuthzError};
use supplierdesk_client::Dashboard;
use supplierdesk_core::{SupplierId, SupplierRecord, SupplierStatus, UserId, UserRecord};
use supplierdesk_session::{Clock, ManualClock, MemoryStorage, SessionStorage};
use supplierdesk_sync::{ApiError, SupplierApi, SyncError, UserChanges};

const EPOCH: i64 = 1_700_000_000;

fn mint(role: &str, ttl_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(
        json!({ "sub": "reviewer1", "role": role, "iat": EPOCH, "exp": EPOCH + ttl_secs })
            .to_string(),
    );
    format!("{}.{}.sig", header, payload)
}

fn supplier(id: &str, status: SupplierStatus) -> SupplierRecord {
    SupplierRecord {
        id: SupplierId::from(id),
        company_name: format!("Company {id}"),
        contact_person: "Contact".to_string(),
        email: format!("{id}@example.com"),
        business_type: None,
        phone: None,
        website: None,
        tax_id: None,
        years_in_business: None,
        address: None,
        certifications: Vec::new(),
        status,
    }
}

#[derive(Default)]
struct FakeApi {
    suppliers: Mutex<Vec<SupplierRecord>>,
    fetch_error: Mutex<Option<ApiError>>,
    fetch_calls: AtomicUsize,
    patch_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl SupplierApi for FakeApi {
    async fn fetch_suppliers(&self, _credential: &str) -> Result<Vec<SupplierRecord>, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fetch_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.suppliers.lock().unwrap().clone())
    }

    async fn patch_supplier_status(
        &self,
        _credential: &str,
        id: &SupplierId,
        status: SupplierStatus,
    ) -> Result<(), ApiError> {
        self.patch_calls.fetch_add(1, Ordering::SeqCst);
        let mut suppliers = self.suppliers.lock().unwrap();
        if let Some(record) = suppliers.iter_mut().find(|r| r.id == *id) {
            record.status = status;
        }
        Ok(())
    }

    async fn fetch_users(&self, _credential: &str) -> Result<Vec<UserRecord>, ApiError> {
        Ok(Vec::new())
    }

    async fn patch_user(
        &self,
        _credential: &str,
        _id: &UserId,
        _changes: &UserChanges,
    ) -> Result<(), ApiError> {
        Ok(())
    }
}

fn dashboard(api: Arc<FakeApi>) -> Dashboard<FakeApi> {
    dashboard_on(api, Arc::new(MemoryStorage::new()))
}

fn dashboard_on(api: Arc<FakeApi>, storage: Arc<dyn SessionStorage>) -> Dashboard<FakeApi> {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(
        chrono::DateTime::from_timestamp(EPOCH, 0).unwrap(),
    ));
    Dashboard::with_parts(api, storage, clock)
}

#[tokio::test(start_paused = true)]
async fn login_brings_the_supplier_list_up() {
    let api = Arc::new(FakeApi::default());
    *api.suppliers.lock().unwrap() = vec![
        supplier("a", SupplierStatus::Pending),
        supplier("b", SupplierStatus::Approved),
    ];
    let dash = dashboard(Arc::clone(&api));

    let identity = dash.login(mint("member", 86_400)).await.unwrap();
    assert_eq!(identity.subject, "reviewer1");

    tokio::task::yield_now().await;
    assert_eq!(dash.suppliers().await.len(), 2);
    assert!(dash.is_logged_in().await);
}

#[tokio::test(start_paused = true)]
async fn member_sees_the_list_but_cannot_review() {
    let api = Arc::new(FakeApi::default());
    *api.suppliers.lock().unwrap() = vec![supplier("a", SupplierStatus::Pending)];
    let dash = dashboard(Arc::clone(&api));
    dash.login(mint("member", 86_400)).await.unwrap();
    tokio::task::yield_now().await;

    assert!(dash.can(Action::ViewSupplierList).await);
    assert!(!dash.can(Action::MutateSupplierStatus).await);
    assert!(!dash.can(Action::ManageUsers).await);

    let err = dash
        .set_supplier_status(&SupplierId::from("a"), SupplierStatus::Approved)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SyncError::Denied(AuthzError::Forbidden("suppliers.mutate_status"))
    );
    assert_eq!(api.patch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        dash.supplier(&SupplierId::from("a")).await.unwrap().status,
        SupplierStatus::Pending
    );
}

#[tokio::test(start_paused = true)]
async fn admin_reviews_a_supplier() {
    let api = Arc::new(FakeApi::default());
    *api.suppliers.lock().unwrap() = vec![supplier("a", SupplierStatus::Pending)];
    let dash = dashboard(Arc::clone(&api));
    dash.login(mint("admin", 86_400)).await.unwrap();
    tokio::task::yield_now().await;

    dash.set_supplier_status(&SupplierId::from("a"), SupplierStatus::Approved)
        .await
        .unwrap();
    assert_eq!(
        dash.supplier(&SupplierId::from("a")).await.unwrap().status,
        SupplierStatus::Approved
    );
    assert_eq!(api.patch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_credential_forces_logout_but_keeps_stale_data() {
    let api = Arc::new(FakeApi::default());
    *api.suppliers.lock().unwrap() = vec![supplier("a", SupplierStatus::Pending)];
    let dash = dashboard(Arc::clone(&api));
    dash.login(mint("member", 86_400)).await.unwrap();
    tokio::task::yield_now().await;
    assert_eq!(dash.suppliers().await.len(), 1);

    *api.fetch_error.lock().unwrap() = Some(ApiError::Unauthorized);
    dash.sync_now().await;

    assert!(!dash.is_logged_in().await);
    // The mirror is not wiped; the shell decides what to show.
    assert_eq!(dash.suppliers().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn logout_stops_the_polling_loop() {
    let api = Arc::new(FakeApi::default());
    let dash = dashboard(Arc::clone(&api));
    dash.login(mint("member", 86_400)).await.unwrap();
    tokio::task::yield_now().await;

    dash.logout().await;
    assert!(!dash.is_logged_in().await);

    let calls = api.fetch_calls.load(Ordering::SeqCst);
    tokio::time::advance(Duration::from_secs(300)).await;
    tokio::task::yield_now().await;
    assert_eq!(api.fetch_calls.load(Ordering::SeqCst), calls);
}

#[tokio::test(start_paused = true)]
async fn persisted_session_survives_a_restart() {
    let api = Arc::new(FakeApi::default());
    *api.suppliers.lock().unwrap() = vec![supplier("a", SupplierStatus::Pending)];
    let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());

    {
        let dash = dashboard_on(Arc::clone(&api), Arc::clone(&storage));
        dash.login(mint("member", 86_400)).await.unwrap();
        tokio::task::yield_now().await;
        // Dropped without logout, as a window close would.
    }

    let dash = dashboard_on(Arc::clone(&api), storage);
    assert!(dash.restore().await.unwrap());
    tokio::task::yield_now().await;
    assert!(dash.is_logged_in().await);
    assert_eq!(dash.suppliers().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_persisted_credential_is_discarded_on_restore() {
    let api = Arc::new(FakeApi::default());
    let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
    let clock = ManualClock::at(chrono::DateTime::from_timestamp(EPOCH, 0).unwrap());

    {
        let dash = Dashboard::with_parts(
            Arc::clone(&api),
            Arc::clone(&storage),
            Arc::new(clock.clone()),
        );
        dash.login(mint("member", 60)).await.unwrap();
        tokio::task::yield_now().await;
    }

    clock.advance(chrono::Duration::seconds(300));
    let dash = Dashboard::with_parts(api, storage, Arc::new(clock));
    assert!(!dash.restore().await.unwrap());
    assert!(!dash.is_logged_in().await);
}
