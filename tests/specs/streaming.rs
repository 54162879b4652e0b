//! Subscription streaming specs.

use crate::prelude::*;
use serde_json::json;

#[tokio::test]
async fn subscriber_receives_matching_task_events() {
    let hub = Hub::boot().await;

    let mut watcher = hub.client("bob", "B").await;
    let subscribed = watcher
        .request(json!({"type": "subscribe", "patterns": ["TASK_*"]}))
        .await;
    assert_eq!(subscribed["type"], "result");

    // A second connection drives a task transition
    let mut worker = hub.client("alice", "T").await;
    worker
        .request(json!({"type": "create_task", "title": "streamed", "taskId": "t1"}))
        .await;
    worker
        .request(json!({"type": "update_task_status", "taskId": "t1", "status": "in_progress"}))
        .await;

    let event = watcher
        .wait_for(|frame| {
            frame["type"] == "stream_event" && frame["event"]["type"] == "TASK_STARTED"
        })
        .await;
    assert_eq!(event["event"]["taskId"], "t1");
    assert_eq!(event["event"]["agent"], "alice");
    assert!(event["event"]["id"].is_string());
    assert!(event["event"]["timestamp"].is_string());
}

#[tokio::test]
async fn non_matching_events_are_not_streamed() {
    let hub = Hub::boot().await;

    let mut watcher = hub.client("bob", "B").await;
    watcher
        .request(json!({"type": "subscribe", "patterns": ["WORKFLOW_*"]}))
        .await;

    let mut worker = hub.client("alice", "T").await;
    worker
        .request(json!({"type": "create_task", "title": "quiet", "taskId": "t1"}))
        .await;

    // The watcher sees nothing; prove liveness with a ping round-trip
    let pong = watcher.request(json!({"type": "ping"})).await;
    assert_eq!(pong["pong"], true);
}

#[tokio::test]
async fn wildcard_subscription_sees_everything() {
    let hub = Hub::boot().await;

    let mut watcher = hub.client("bob", "B").await;
    watcher
        .request(json!({"type": "subscribe", "patterns": ["*"]}))
        .await;

    let mut worker = hub.client("alice", "T").await;
    worker
        .request(json!({"type": "create_task", "title": "seen", "taskId": "t1"}))
        .await;

    let event = watcher
        .wait_for(|frame| frame["type"] == "stream_event")
        .await;
    assert_eq!(event["event"]["type"], "TASK_CREATED");
}

#[tokio::test]
async fn unsubscribe_silences_the_stream() {
    let hub = Hub::boot().await;

    let mut watcher = hub.client("bob", "B").await;
    watcher
        .request(json!({"type": "subscribe", "patterns": ["*"]}))
        .await;
    watcher.request(json!({"type": "unsubscribe"})).await;

    let mut worker = hub.client("alice", "T").await;
    worker
        .request(json!({"type": "create_task", "title": "silent", "taskId": "t1"}))
        .await;

    let pong = watcher.request(json!({"type": "ping"})).await;
    assert_eq!(pong["pong"], true, "no stream frames before the reply");
}
