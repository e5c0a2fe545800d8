//! Health check endpoint tests.
//!
//! Verifies the probe endpoints report store connectivity and respond with
//! structured JSON.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;
use usersync_api::{create_router, AppState, WebhookSettings};
use usersync_core::{
    storage::{memory::InMemoryUserStore, StoreFuture},
    TestClock, UserId, UserRecord, UserStore,
};

/// Store whose health check never answers in time.
struct StalledStore;

impl UserStore for StalledStore {
    fn create(&self, _record: UserRecord) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn replace_by_id(&self, _id: UserId, _record: UserRecord) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn delete_by_id(&self, _id: UserId) -> StoreFuture<'_, bool> {
        Box::pin(async { Ok(false) })
    }

    fn find_by_id(&self, _id: UserId) -> StoreFuture<'_, Option<UserRecord>> {
        Box::pin(async { Ok(None) })
    }

    fn health_check(&self) -> StoreFuture<'_, ()> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
    }
}

fn state(store: InMemoryUserStore, secret: Option<&str>) -> AppState {
    AppState::new(Arc::new(store), WebhookSettings::new(secret.map(str::to_string)))
        .with_clock(Arc::new(TestClock::at_unix(1_700_000_000)))
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    let response = create_router(state).oneshot(request).await.expect("failed to make request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("failed to read body");
    (status, serde_json::from_slice(&bytes).expect("response should be valid JSON"))
}

/// Health check returns 200 with component details when the store is up.
#[tokio::test]
async fn health_check_returns_success_when_healthy() {
    let (status, body) = get(state(InMemoryUserStore::new(), Some("whsec_c2VjcmV0")), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert_eq!(body["webhook_secret_configured"], true);
    assert!(body.get("version").is_some());
}

/// Health check returns 503 when the store cannot be reached.
#[tokio::test]
async fn health_check_reports_unavailable_store() {
    let store = InMemoryUserStore::new();
    store.inject_error("connection refused").await;

    let (status, body) = get(state(store, None), "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"]["status"], "down");
    assert_eq!(body["webhook_secret_configured"], false);
}

/// Readiness mirrors health.
#[tokio::test]
async fn readiness_check_mirrors_health() {
    let (status, body) = get(state(InMemoryUserStore::new(), None), "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

/// Liveness answers even when the store is down.
#[tokio::test]
async fn liveness_check_ignores_store() {
    let store = InMemoryUserStore::new();
    store.inject_error("connection refused").await;

    let (status, body) = get(state(store, None), "/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
    assert_eq!(body["service"], "usersync-api");
    assert_eq!(body["timestamp"], "2023-11-14T22:13:20Z");
}

/// The webhook route only accepts POST.
#[tokio::test]
async fn webhook_route_rejects_get() {
    let request = Request::builder().method("GET").uri("/api/clerk").body(Body::empty()).unwrap();

    let response = create_router(state(InMemoryUserStore::new(), None))
        .oneshot(request)
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

/// Requests exceeding the configured timeout are answered with 408.
#[tokio::test]
async fn slow_request_times_out_with_request_timeout_status() {
    let state = AppState::new(Arc::new(StalledStore), WebhookSettings::new(None))
        .with_request_timeout(Duration::from_millis(50));
    let request = Request::builder().method("GET").uri("/health").body(Body::empty()).unwrap();

    let response = create_router(state).oneshot(request).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
