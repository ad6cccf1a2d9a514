// Shared helpers for the HTTP-level tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use banks_api::{logging::init_test_logging, router, AppState, BankService, BankStore, RemoteMirror};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Nothing listens on port 1: mirror calls fail fast
pub const UNREACHABLE_PEER: &str = "http://127.0.0.1:1";

pub fn app_with_peer(peer: &str) -> Router {
    init_test_logging();

    let store = BankStore::open_in_memory().expect("in-memory store");
    let mirror = RemoteMirror::new(peer, Duration::from_secs(5)).expect("mirror client");

    router(AppState::new(BankService::new(Arc::new(store), mirror)))
}

pub fn app() -> Router {
    app_with_peer(UNREACHABLE_PEER)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send one request; `body` is sent verbatim as JSON text
pub async fn send_raw(app: &Router, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }

    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let text = body.map(|b| b.to_string());
    send_raw(app, method, uri, text.as_deref()).await
}

pub fn bank_json(name: &str, bank_type: &str, branches: &[(&str, &str, &str)]) -> Value {
    json!({
        "name": name,
        "type": bank_type,
        "branches": branches
            .iter()
            .map(|(code, address, phone)| json!({"code": code, "address": address, "phone": phone}))
            .collect::<Vec<_>>(),
    })
}

/// POST a bank and return the created body
pub async fn create_bank(app: &Router, body: Value) -> Value {
    let response = send(app, Method::POST, "/api/banks", Some(body)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body
}

pub fn branch_codes(bank: &Value) -> Vec<String> {
    bank["branches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["code"].as_str().unwrap().to_string())
        .collect()
}

pub fn branch<'a>(bank: &'a Value, code: &str) -> &'a Value {
    bank["branches"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["code"] == code)
        .unwrap()
}
