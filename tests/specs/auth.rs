//! Auth handshake specs.

use crate::prelude::*;
use serde_json::json;

#[tokio::test]
async fn valid_token_gets_auth_ok_with_request_id_echo() {
    let hub = Hub::boot().await;
    let mut wire = hub.connect_raw().await;

    let reply = wire
        .request(json!({"type": "auth", "account": "alice", "token": "T"}))
        .await;
    assert_eq!(reply["type"], "auth_ok");
}

#[tokio::test]
async fn invalid_token_gets_auth_fail_then_eof() {
    let hub = Hub::boot().await;
    let mut wire = hub.connect_raw().await;

    wire.send(json!({"type": "auth", "account": "alice", "token": "X"}))
        .await;
    let reply = wire.read_frame().await;
    assert_eq!(reply["type"], "auth_fail");
    assert_eq!(reply["error"], "Invalid token");

    assert!(
        wire.try_read_frame().await.is_none(),
        "connection should close after auth failure"
    );
}

#[tokio::test]
async fn unknown_account_fails() {
    let hub = Hub::boot().await;
    let mut wire = hub.connect_raw().await;

    wire.send(json!({"type": "auth", "account": "mallory", "token": "T"}))
        .await;
    let reply = wire.read_frame().await;
    assert_eq!(reply["type"], "auth_fail");
}

#[tokio::test]
async fn first_frame_must_be_auth() {
    let hub = Hub::boot().await;
    let mut wire = hub.connect_raw().await;

    wire.send(json!({"type": "ping"})).await;
    let reply = wire.read_frame().await;
    assert_eq!(reply["type"], "auth_fail");
    assert!(wire.try_read_frame().await.is_none());
}

#[tokio::test]
async fn malformed_account_name_fails() {
    let hub = Hub::boot().await;
    let mut wire = hub.connect_raw().await;

    wire.send(json!({"type": "auth", "account": "../etc", "token": "T"}))
        .await;
    let reply = wire.read_frame().await;
    assert_eq!(reply["type"], "auth_fail");
}

#[tokio::test]
async fn authenticated_connection_answers_ping() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    let reply = client.request(json!({"type": "ping"})).await;
    assert_eq!(reply["type"], "result");
    assert_eq!(reply["pong"], true);
}

#[tokio::test]
async fn sessions_are_tracked_per_connection() {
    let hub = Hub::boot().await;
    let alice = hub.client("alice", "T").await;
    let mut bob = hub.client("bob", "B").await;

    let health = bob.request(json!({"type": "health_check"})).await;
    assert_eq!(health["sessions"], 2);

    // Disconnect removes the session (teardown is asynchronous)
    drop(alice);
    for _ in 0..50 {
        let health = bob.request(json!({"type": "health_check"})).await;
        if health["sessions"] == 1 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("disconnected session was not removed");
}
