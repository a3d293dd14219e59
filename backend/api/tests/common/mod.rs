//! Shared scaffolding for the integration tests: an in-memory app with
//! stub collaborators, request helpers, and scenario setup.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

use dpp_api::api::{self, AppState};
use dpp_api::auth::SignatureVerifier;
use dpp_api::clients::{ContentStore, LedgerAnchor};
use dpp_api::config::Config;
use dpp_api::db;
use dpp_api::errors::{ApiError, Result};

pub const OWNER_WALLET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const CONTRACTOR_WALLET: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const INSTALLER_WALLET: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
pub const SUPPLIER_WALLET: &str = "0xdddddddddddddddddddddddddddddddddddddddd";
pub const REGULATOR_WALLET: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

// ─── stub collaborators ───

/// In-memory content store handing out sequential CIDs.
#[derive(Default)]
pub struct StubContentStore {
    counter: AtomicUsize,
    stored: Mutex<HashMap<String, (Vec<u8>, Option<String>)>>,
}

impl StubContentStore {
    fn next_cid(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("bafy-test-{n}")
    }
}

#[async_trait]
impl ContentStore for StubContentStore {
    async fn put_file(
        &self,
        bytes: Vec<u8>,
        _file_name: &str,
        content_type: &str,
    ) -> Result<String> {
        let cid = self.next_cid();
        self.stored
            .lock()
            .unwrap()
            .insert(cid.clone(), (bytes, Some(content_type.to_string())));
        Ok(cid)
    }

    async fn put_json(&self, value: &Value) -> Result<String> {
        let cid = self.next_cid();
        self.stored.lock().unwrap().insert(
            cid.clone(),
            (value.to_string().into_bytes(), Some("application/json".into())),
        );
        Ok(cid)
    }

    async fn get(&self, cid: &str) -> Result<(Vec<u8>, Option<String>)> {
        self.stored
            .lock()
            .unwrap()
            .get(cid)
            .cloned()
            .ok_or_else(|| ApiError::External("unknown cid".into()))
    }

    fn url_for(&self, cid: &str) -> String {
        format!("http://gateway.test/ipfs/{cid}")
    }
}

pub struct StubLedger;

#[async_trait]
impl LedgerAnchor for StubLedger {
    async fn anchor_project(&self, _: &str, _: Option<&str>) -> Result<String> {
        Ok("0xtest-anchor".into())
    }
    async fn mint_passport(&self, _: &str, _: &str, _: Option<&str>) -> Result<String> {
        Ok("0xtest-anchor".into())
    }
    async fn anchor_installation(&self, _: &str, _: Option<&str>) -> Result<String> {
        Ok("0xtest-anchor".into())
    }
    async fn anchor_enrichment(&self, _: &str, _: Option<&str>) -> Result<String> {
        Ok("0xtest-anchor".into())
    }
}

/// Collaborator that is always down.
pub struct FailingContentStore;

#[async_trait]
impl ContentStore for FailingContentStore {
    async fn put_file(&self, _: Vec<u8>, _: &str, _: &str) -> Result<String> {
        Err(ApiError::External("pinning service unavailable".into()))
    }
    async fn put_json(&self, _: &Value) -> Result<String> {
        Err(ApiError::External("pinning service unavailable".into()))
    }
    async fn get(&self, _: &str) -> Result<(Vec<u8>, Option<String>)> {
        Err(ApiError::External("pinning service unavailable".into()))
    }
    fn url_for(&self, cid: &str) -> String {
        format!("http://gateway.test/ipfs/{cid}")
    }
}

pub struct FailingLedger;

#[async_trait]
impl LedgerAnchor for FailingLedger {
    async fn anchor_project(&self, _: &str, _: Option<&str>) -> Result<String> {
        Err(ApiError::External("ledger unavailable".into()))
    }
    async fn mint_passport(&self, _: &str, _: &str, _: Option<&str>) -> Result<String> {
        Err(ApiError::External("ledger unavailable".into()))
    }
    async fn anchor_installation(&self, _: &str, _: Option<&str>) -> Result<String> {
        Err(ApiError::External("ledger unavailable".into()))
    }
    async fn anchor_enrichment(&self, _: &str, _: Option<&str>) -> Result<String> {
        Err(ApiError::External("ledger unavailable".into()))
    }
}

/// Signature verifier that always recovers the same address.
pub struct StaticVerifier {
    pub address: String,
}

#[async_trait]
impl SignatureVerifier for StaticVerifier {
    async fn recover(&self, _message: &str, _signature: &str) -> Result<String> {
        Ok(self.address.clone())
    }
}

// ─── app construction ───

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        database_url: "sqlite::memory:".into(),
        app_env: "test".into(),
        frontend_url: "http://localhost:5173".into(),
        token_ttl_secs: 3600,
        pinata_api_url: "http://pinata.test".into(),
        pinata_jwt: String::new(),
        pinata_gateway: "http://gateway.test".into(),
        ipfs_max_retries: 1,
        ipfs_retry_delay_ms: 1,
        ledger_rpc_url: String::new(),
        signer_recovery_url: String::new(),
        max_upload_bytes: 1024 * 1024,
        allowed_file_types: vec![
            "image/jpeg".into(),
            "image/png".into(),
            "application/pdf".into(),
        ],
    }
}

pub async fn spawn() -> TestApp {
    spawn_with(Arc::new(StubContentStore::default()), Arc::new(StubLedger), None).await
}

pub async fn spawn_with(
    content_store: Arc<dyn ContentStore>,
    ledger: Arc<dyn LedgerAnchor>,
    signature_verifier: Option<Arc<dyn SignatureVerifier>>,
) -> TestApp {
    let pool = db::init_pool("sqlite::memory:")
        .await
        .expect("in-memory database");
    let state = Arc::new(AppState {
        pool: pool.clone(),
        config: test_config(),
        content_store,
        ledger,
        signature_verifier,
    });
    TestApp {
        router: api::router(state),
        pool,
    }
}

// ─── request helpers ───

pub async fn request(
    app: &TestApp,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn get(app: &TestApp, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    request(app, "GET", path, token, None).await
}

pub async fn post(
    app: &TestApp,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    request(app, "POST", path, token, Some(body)).await
}

pub async fn put(
    app: &TestApp,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    request(app, "PUT", path, token, Some(body)).await
}

// ─── scenario helpers ───

pub async fn register(app: &TestApp, wallet: &str, role: &str, name: &str) -> String {
    let (status, body) = post(
        app,
        "/api/auth/register",
        None,
        json!({ "walletAddress": wallet, "role": role, "name": name }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

pub async fn create_project(app: &TestApp, token: &str, name: &str) -> String {
    let (status, body) = post(
        app,
        "/api/projects/create",
        Some(token),
        json!({ "projectName": name, "projectType": "Residential" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
    body["data"]["project"]["projectId"]
        .as_str()
        .unwrap()
        .to_string()
}

pub async fn add_member(
    app: &TestApp,
    owner_token: &str,
    project_id: &str,
    kind: &str,
    wallet: &str,
) {
    let (status, body) = post(
        app,
        &format!("/api/projects/{project_id}/add-{kind}"),
        Some(owner_token),
        json!({ "walletAddress": wallet }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "add {kind} failed: {body}");
}

pub async fn create_dpp(app: &TestApp, token: &str, project_id: &str) -> String {
    let (status, body) = post(
        app,
        "/api/dpp/create",
        Some(token),
        json!({
            "projectId": project_id,
            "productName": "TMT Steel Bars",
            "category": "Steel",
            "quantity": 25,
            "unit": "ton",
            "procurementData": { "supplierName": "Tata Steel" },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create dpp failed: {body}");
    body["data"]["dpp"]["dppId"].as_str().unwrap().to_string()
}

/// One user per role, plus a project with the three field roles wired
/// onto it.
pub struct Cast {
    pub owner: String,
    pub contractor: String,
    pub installer: String,
    pub supplier: String,
    pub regulator: String,
    pub project_id: String,
}

pub async fn standard_cast(app: &TestApp) -> Cast {
    let owner = register(app, OWNER_WALLET, "owner", "Asha Rao").await;
    let contractor = register(app, CONTRACTOR_WALLET, "contractor", "Vikram Mehta").await;
    let installer = register(app, INSTALLER_WALLET, "installer", "Dinesh Kulkarni").await;
    let supplier = register(app, SUPPLIER_WALLET, "supplier", "Sara Thomas").await;
    let regulator = register(app, REGULATOR_WALLET, "regulator", "Nilesh Joshi").await;

    let project_id = create_project(app, &owner, "Harbor View Residences").await;
    add_member(app, &owner, &project_id, "contractor", CONTRACTOR_WALLET).await;
    add_member(app, &owner, &project_id, "installer", INSTALLER_WALLET).await;
    add_member(app, &owner, &project_id, "supplier", SUPPLIER_WALLET).await;

    Cast {
        owner,
        contractor,
        installer,
        supplier,
        regulator,
        project_id,
    }
}
