//! Common test utilities for refhub integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use refhub_core::{OrgId, RequestId, UserId};
use refhub_engine::{EmploymentDirectory, LogNotifier, Notifier, StaticDirectory};
use refhub_service::{create_router, AppState, ServiceConfig};
use refhub_store::{RocksStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle, for fixtures the API does not expose.
    pub store: Arc<RocksStore>,
    /// Employment directory, for seeding referrer eligibility.
    pub directory: Arc<StaticDirectory>,
    /// The admin API key configured on the server.
    pub admin_api_key: String,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));
        let directory = Arc::new(StaticDirectory::new());

        let admin_api_key = "test-admin-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            admin_api_key: Some(admin_api_key.clone()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            sweep_interval_seconds: 0,
        };

        let state = AppState::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&directory) as Arc<dyn EmploymentDirectory>,
            Arc::new(LogNotifier) as Arc<dyn Notifier>,
            config,
        );
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            directory,
            admin_api_key,
            _temp_dir: temp_dir,
        }
    }

    /// Authorization header carrying the given user's identity.
    pub fn auth_header(user: &UserId) -> String {
        format!("Bearer {user}")
    }

    /// Credit a verified recharge into the user's wallet.
    pub async fn recharge(&self, user: &UserId, amount_paise: i64) {
        self.server
            .post("/v1/wallet/recharge")
            .add_header("authorization", Self::auth_header(user))
            .json(&json!({
                "amount_paise": amount_paise,
                "reference": "order_test"
            }))
            .await
            .assert_status_ok();
    }

    /// Create an external-target referral request and return its ID.
    ///
    /// The target company is randomized so repeated calls for the same
    /// seeker do not trip the duplicate check.
    pub async fn create_referral(&self, seeker: &UserId, org: &OrgId) -> RequestId {
        let response = self
            .server
            .post("/v1/referrals")
            .add_header("authorization", Self::auth_header(seeker))
            .json(&json!({
                "org_id": org.to_string(),
                "resume_url": "https://cdn.example/resume.pdf",
                "target": {
                    "company": format!("Acme {}", RequestId::generate()),
                    "title": "Senior Engineer"
                }
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["id"]
            .as_str()
            .expect("request id in response")
            .parse()
            .expect("valid request id")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
