#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;
use vitals_server::app;
use vitals_server::state::AppState;
use vitals_storage::memory::MemoryRepository;
use vitals_storage::sqlite::SqliteRepository;
use vitals_storage::Repository;

pub struct TestContext {
    pub temp_dir: TempDir,
    pub state: AppState,
    pub app: Router,
}

fn build_context(repo: Arc<dyn Repository>, temp_dir: TempDir, sync_dump: bool) -> TestContext {
    let state = AppState {
        repo,
        snapshot_path: Arc::new(temp_dir.path().join("snapshot.json")),
        sync_dump,
    };
    let app = app::build_app(state.clone());
    TestContext {
        temp_dir,
        state,
        app,
    }
}

/// In-memory repository, background-snapshot mode (no dump on write).
pub fn memory_context() -> TestContext {
    let temp_dir = TempDir::new().expect("temp dir should create");
    build_context(Arc::new(MemoryRepository::new()), temp_dir, false)
}

/// In-memory repository, synchronous-dump mode.
pub fn sync_dump_context() -> TestContext {
    let temp_dir = TempDir::new().expect("temp dir should create");
    build_context(Arc::new(MemoryRepository::new()), temp_dir, true)
}

/// SQLite-backed repository.
pub fn sqlite_context() -> TestContext {
    let temp_dir = TempDir::new().expect("temp dir should create");
    let repo =
        SqliteRepository::open(&temp_dir.path().join("metrics.db")).expect("db should open");
    build_context(Arc::new(repo), temp_dir, false)
}

pub async fn request_no_body(app: &Router, method: &str, path: &str) -> (StatusCode, Vec<u8>) {
    request_raw(app, method, path, &[], Vec::new()).await
}

pub async fn request_json(
    app: &Router,
    method: &str,
    path: &str,
    body: Value,
) -> (StatusCode, Vec<u8>) {
    request_raw(
        app,
        method,
        path,
        &[("content-type", "application/json")],
        body.to_string().into_bytes(),
    )
    .await
}

pub async fn request_raw(
    app: &Router,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Vec<u8>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(Body::from(body))
        .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("app should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    (status, bytes.to_vec())
}

pub fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("body should be JSON")
}

pub fn text(body: &[u8]) -> String {
    String::from_utf8(body.to_vec()).expect("body should be UTF-8")
}
