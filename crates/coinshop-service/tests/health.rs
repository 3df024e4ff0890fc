//! Health endpoint integration tests.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;

use coinshop_core::LedgerConfig;
use coinshop_service::{create_router, AppState, ServiceConfig};
use coinshop_store::{Database, Ledger, Session, StoreError};
use common::TestHarness;

/// A backend that never answers.
struct UnreachableDatabase;

#[async_trait]
impl Database for UnreachableDatabase {
    async fn begin(&self) -> coinshop_store::Result<Box<dyn Session>> {
        Err(StoreError::Database("connection refused".into()))
    }

    async fn ping(&self) -> coinshop_store::Result<()> {
        Err(StoreError::Database("connection refused".into()))
    }
}

#[tokio::test]
async fn health_check_returns_ok() {
    let harness = TestHarness::new();

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn health_check_returns_json() {
    let harness = TestHarness::new();

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "coinshop");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn unreachable_database_reports_degraded() {
    let ledger = Arc::new(Ledger::new(
        Arc::new(UnreachableDatabase),
        LedgerConfig::default(),
    ));
    let state = AppState::new(ledger, ServiceConfig::default());
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], false);
}
