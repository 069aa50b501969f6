//! Test utilities and common setup.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use dirserve::{AppState, Config, build_router};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BASE: &str = "/api/v1/files";

/// Create a test application serving a fresh temp directory.
///
/// The `TempDir` must outlive the router.
pub fn test_app() -> (Router, TempDir) {
    test_app_with_config(Config::default())
}

pub fn test_app_with_config(config: Config) -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let state = AppState::with_config(temp_dir.path().to_path_buf(), config);
    (build_router(state), temp_dir)
}

/// Send one request through a clone of the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("{BASE}{path}"))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap()
}

pub fn get_if_none_match(path: &str, etag: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("{BASE}{path}"))
        .method(Method::GET)
        .header("If-None-Match", etag)
        .body(Body::empty())
        .unwrap()
}

pub fn upload(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .uri(format!("{BASE}{path}"))
        .method(Method::POST)
        .body(body.into())
        .unwrap()
}

pub fn mkdir(path: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("{BASE}{path}?isDirectory"))
        .method(Method::POST)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(path: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("{BASE}{path}"))
        .method(Method::DELETE)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
