//! Error handling specs.

use crate::prelude::*;
use serde_json::json;

#[tokio::test]
async fn unknown_request_type_is_reported_and_connection_survives() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    let reply = client.request(json!({"type": "warp_core_breach"})).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["error"], "unknown type");
    assert_eq!(reply["details"]["kind"], "validation");

    // The connection stays usable
    let pong = client.request(json!({"type": "ping"})).await;
    assert_eq!(pong["pong"], true);
}

#[tokio::test]
async fn invalid_json_lines_are_skipped() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    // Raw garbage followed by a valid request on the same connection
    client.send_raw("this is not json\n").await;
    let pong = client.request(json!({"type": "ping"})).await;
    assert_eq!(pong["pong"], true);
}

#[tokio::test]
async fn missing_required_fields_are_validation_errors() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    let reply = client
        .request(json!({"type": "update_task_status", "taskId": "t1"}))
        .await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["details"]["kind"], "validation");
}

#[tokio::test]
async fn missing_task_is_not_found() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    let reply = client
        .request(json!({"type": "get_task", "taskId": "ghost"}))
        .await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["details"]["kind"], "not_found");
}

#[tokio::test]
async fn oversize_frame_closes_the_connection() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    // 1 MiB of payload without a newline overflows the frame budget
    let blob = "x".repeat(hub_daemon::MAX_FRAME_BYTES + 64);
    client.send_raw(&blob).await;

    assert!(
        client.try_read_frame().await.is_none(),
        "daemon should drop the connection"
    );
}

#[tokio::test]
async fn pipelined_requests_before_an_oversize_line_get_replies() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    // A valid request and an over-long partial line written together:
    // the valid frame is answered before the overflow kills the socket.
    let mut payload = json!({"type": "ping", "requestId": "keep-me"}).to_string();
    payload.push('\n');
    payload.push_str(&"x".repeat(hub_daemon::MAX_FRAME_BYTES + 64));
    client.send_raw(&payload).await;

    let reply = client
        .wait_for(|frame| frame["requestId"] == "keep-me")
        .await;
    assert_eq!(reply["pong"], true);

    assert!(
        client.try_read_frame().await.is_none(),
        "connection closes once the overflow is hit"
    );
}

#[tokio::test]
async fn second_auth_is_rejected_but_not_fatal() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    let reply = client
        .request(json!({"type": "auth", "account": "alice", "token": "T"}))
        .await;
    assert_eq!(reply["type"], "error");

    let pong = client.request(json!({"type": "ping"})).await;
    assert_eq!(pong["pong"], true);
}
