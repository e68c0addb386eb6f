#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use studio_api::config::ServerConfig;
use studio_api::engagement::EngagementRegistry;
use studio_api::router::build_app_router;
use studio_api::state::AppState;
use studio_core::controller::{LifecycleController, PersistenceMode};
use studio_core::source::{MemoryCatalogSource, MemoryKeyValueStore, MemoryProjectSource};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        demo_mode: false,
        persist_timeout_secs: 2,
        engagement_dir: std::env::temp_dir().join("studio-api-tests"),
    }
}

/// A router over in-memory sources plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    /// The primary project store; toggle `set_offline` to simulate an outage.
    pub store: Arc<MemoryProjectSource>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router on the demo dataset in live mode.
///
/// Uses the same `build_app_router` as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app() -> TestApp {
    build_test_app_with_mode(PersistenceMode::Live)
}

pub fn build_test_app_with_mode(mode: PersistenceMode) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryProjectSource::new(studio_db::seed::demo_projects()));
    let fallback = Arc::new(MemoryProjectSource::new(studio_db::seed::demo_projects()));

    let controller = LifecycleController::new(store.clone(), mode)
        .with_fallback(fallback)
        .with_persist_timeout(config.persist_timeout());

    let state = AppState {
        pool: None,
        config: Arc::new(config.clone()),
        controller: Arc::new(controller),
        catalog: Arc::new(MemoryCatalogSource::new(studio_db::seed::demo_catalog())),
        engagement: Arc::new(EngagementRegistry::new(Arc::new(MemoryKeyValueStore::new()))),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_as(app: Router, uri: &str, client: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("x-client-id", client)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn json_request(method: Method, uri: &str, body: &Value, client: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(client) = client {
        builder = builder.header("x-client-id", client);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, &body, None)).await
}

pub async fn post_json_as(app: Router, uri: &str, body: Value, client: &str) -> Response<Body> {
    send(app, json_request(Method::POST, uri, &body, Some(client))).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, &body, None)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
