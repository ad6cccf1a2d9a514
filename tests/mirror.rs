// Remote mirror against a real peer: this crate's own router on a loopback port

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use pretty_assertions::assert_eq;
use std::time::Duration;

/// Serve a fresh app on 127.0.0.1:<random>, return its base URL
async fn spawn_peer() -> (String, axum::Router) {
    let peer = app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let served = peer.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });

    (format!("http://{}", addr), peer)
}

#[tokio::test]
async fn test_consume_returns_peer_banks_verbatim() {
    let (peer_url, peer) = spawn_peer().await;
    create_bank(&peer, bank_json("Remote Bank", "PUBLIC", &[("0001", "A", "1")])).await;

    let peer_listing = send(&peer, Method::GET, "/api/banks", None).await;

    // Trailing slash on the configured base URL is tolerated
    let app = app_with_peer(&format!("{}/", peer_url));
    let response = send(&app, Method::GET, "/api/banks/consume", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, peer_listing.body);

    // Local store untouched
    let local = send(&app, Method::GET, "/api/banks", None).await;
    assert_eq!(local.body, serde_json::json!([]));
}

#[tokio::test]
async fn test_mirror_fetch_banks_typed() {
    let (peer_url, peer) = spawn_peer().await;
    create_bank(&peer, bank_json("Remote Bank", "PRIVATE", &[("0009", "A", "1")])).await;

    let mirror = banks_api::RemoteMirror::new(peer_url, Duration::from_secs(5)).unwrap();
    let banks = mirror.fetch_banks().await.unwrap();

    assert_eq!(banks.len(), 1);
    assert_eq!(banks[0].name, "Remote Bank");
    assert_eq!(banks[0].bank_type, banks_api::BankType::Private);
    assert_eq!(banks[0].branches[0].code, "0009");
}

#[tokio::test]
async fn test_unreachable_peer_is_internal_error() {
    let app = app();

    let response = send(&app, Method::GET, "/api/banks/consume", None).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["message"], "Internal server error");
}
