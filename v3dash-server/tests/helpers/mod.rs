//! Shared helpers for router-level tests
//!
//! Each test gets its own in-memory database and, when it needs one, a
//! wiremock server standing in for the extraction backend.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;
use v3dash_common::config::DashboardConfig;
use v3dash_server::services::BackendClient;
use v3dash_server::{build_router, AppState};

pub const BOUNDARY: &str = "v3dash-test-boundary";

/// Test harness: router plus the pool behind it
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// App talking to `backend_url` (use an unroutable URL when no backend call is expected)
    pub async fn new(backend_url: &str) -> Self {
        let db = v3dash_server::db::init_memory_pool()
            .await
            .expect("Should create in-memory database");
        let config = DashboardConfig {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            ..DashboardConfig::default()
        };
        let backend = BackendClient::new(config.backend_url.clone(), None)
            .expect("Should build backend client");
        let state = AppState::new(db, backend, config);

        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn without_backend() -> Self {
        Self::new("http://127.0.0.1:9").await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router should respond")
    }

    /// Send and decode the JSON body
    pub async fn send_json(&self, request: Request<Body>) -> (u16, Value) {
        let response = self.send(request).await;
        let status = response.status().as_u16();
        (status, extract_json(response.into_body()).await)
    }

    pub async fn get(&self, uri: &str) -> (u16, Value) {
        self.send_json(empty_request("GET", uri)).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (u16, Value) {
        self.send_json(json_request("POST", uri, body)).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (u16, Value) {
        self.send_json(json_request("PUT", uri, body)).await
    }

    /// POST a multipart form with one `file` part per entry
    pub async fn post_files(&self, uri: &str, files: &[(&str, &str, &[u8])]) -> (u16, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(files)))
            .unwrap();
        self.send_json(request).await
    }
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Encode `(file name, content type, bytes)` entries as multipart/form-data
pub fn multipart_body(files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
