#![allow(dead_code)]

use api::AppState;
use api::store::MemoryCarStore;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use common::config::Admin;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_USER: &str = "root";
pub const ADMIN_PASS: &str = "hunter2";

pub fn app() -> (Router, Arc<MemoryCarStore>) {
    let store = Arc::new(MemoryCarStore::new());
    let admin = Admin {
        admin_user: ADMIN_USER.into(),
        admin_pass: ADMIN_PASS.into(),
        session_secret: "test-secret".into(),
    };
    let state = AppState::new(store.clone(), admin).expect("state should build");
    (api::router(state), store)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    Reply {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub fn json(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub async fn create(app: &Router, body: Value) -> Value {
    let reply = send(app, json(Method::POST, "/cars", &body)).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    reply.body
}
