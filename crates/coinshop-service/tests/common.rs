//! Common test utilities for coinshop integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use coinshop_core::LedgerConfig;
use coinshop_service::{create_router, AppState, ServiceConfig};
use coinshop_store::{Ledger, MemoryDatabase};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The backend behind the server, for inspecting committed state.
    pub db: Arc<MemoryDatabase>,
    /// The service configuration.
    pub config: ServiceConfig,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory backend.
    pub fn new() -> Self {
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            jwt_secret: "test-jwt-secret".into(),
            secret_pepper: "test-pepper".into(),
            ..ServiceConfig::default()
        };

        let ledger_config = LedgerConfig::default();
        let db = Arc::new(MemoryDatabase::new(&ledger_config.catalog));
        let ledger = Arc::new(Ledger::new(db.clone(), ledger_config));

        let state = AppState::new(ledger, config.clone());
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, db, config }
    }

    /// Log in (creating the account if needed) and return the token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/auth")
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["token"]
            .as_str()
            .expect("token in auth response")
            .to_string()
    }

    /// Authorization header for a token.
    pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header value");
        (AUTHORIZATION, value)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
