//! Task lifecycle specs over the wire.

use crate::prelude::*;
use serde_json::json;

async fn create_and_start(client: &mut Wire, id: &str) {
    let created = client
        .request(json!({"type": "create_task", "title": "spec task", "taskId": id}))
        .await;
    assert_eq!(created["type"], "result", "{created}");

    let started = client
        .request(json!({"type": "update_task_status", "taskId": id, "status": "in_progress"}))
        .await;
    assert_eq!(started["task"]["status"], "in_progress");
    assert_eq!(started["task"]["assignee"], "alice");
}

#[tokio::test]
async fn full_acceptance_path() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    create_and_start(&mut client, "t1").await;

    let submitted = client
        .request(json!({"type": "update_task_status", "taskId": "t1", "status": "ready_for_review"}))
        .await;
    assert_eq!(submitted["task"]["status"], "ready_for_review");
    // No workspace/handoff: auto-acceptance has nothing to verify
    assert_eq!(submitted["acceptance"], "none");

    let accepted = client
        .request(json!({"type": "update_task_status", "taskId": "t1", "status": "accepted"}))
        .await;
    assert_eq!(accepted["task"]["status"], "accepted");
}

#[tokio::test]
async fn rejection_escalates_on_the_third_strike() {
    let hub = Hub::boot().await;
    let mut client = hub.client("alice", "T").await;

    create_and_start(&mut client, "t1").await;

    for round in 1..=2 {
        client
            .request(
                json!({"type": "update_task_status", "taskId": "t1", "status": "ready_for_review"}),
            )
            .await;
        let rejected = client
            .request(json!({
                "type": "update_task_status",
                "taskId": "t1",
                "status": "rejected",
                "reason": format!("r{round}"),
            }))
            .await;
        assert_eq!(rejected["task"]["status"], "in_progress");
        assert_eq!(rejected["task"]["rejectionCount"], round);
    }

    client
        .request(json!({"type": "update_task_status", "taskId": "t1", "status": "ready_for_review"}))
        .await;
    let third = client
        .request(json!({
            "type": "update_task_status",
            "taskId": "t1",
            "status": "rejected",
            "reason": "r3",
        }))
        .await;
    assert_eq!(third["task"]["status"], "needs_review");
    assert_eq!(third["task"]["rejectionCount"], 3);

    let events = third["task"]["events"].as_array().unwrap();
    let escalated: Vec<_> = events
        .iter()
        .filter(|e| e["kind"] == "escalated")
        .collect();
    assert_eq!(escalated.len(), 1);
    assert!(escalated[0]["reason"]
        .as_str()
        .unwrap()
        .contains("Rejected 3 times"));
}

#[tokio::test]
async fn board_survives_daemon_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = hub_daemon::Config::for_dir(dir.path());
    std::fs::create_dir_all(&config.tokens_dir).unwrap();
    std::fs::write(config.tokens_dir.join("alice.token"), "T\n").unwrap();

    // First daemon: create a task
    {
        let startup = hub_daemon::lifecycle::startup(
            config.clone(),
            hub_daemon::Features::default(),
            hub_daemon::ExternalDeps::default(),
        )
        .await
        .unwrap();
        let mut daemon = startup.spawn();

        let stream = tokio::net::UnixStream::connect(&config.socket_path).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut wire = wire_from(reader, writer);
        wire.request(json!({"type": "auth", "account": "alice", "token": "T"}))
            .await;
        wire.request(json!({"type": "create_task", "title": "persistent", "taskId": "t1"}))
            .await;

        daemon.shutdown();
    }

    // Second daemon on the same hub dir: the board is recovered
    {
        let startup = hub_daemon::lifecycle::startup(
            config.clone(),
            hub_daemon::Features::default(),
            hub_daemon::ExternalDeps::default(),
        )
        .await
        .unwrap();
        let mut daemon = startup.spawn();

        let stream = tokio::net::UnixStream::connect(&config.socket_path).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut wire = wire_from(reader, writer);
        wire.request(json!({"type": "auth", "account": "alice", "token": "T"}))
            .await;
        let reply = wire
            .request(json!({"type": "get_task", "taskId": "t1"}))
            .await;
        assert_eq!(reply["task"]["title"], "persistent");

        daemon.shutdown();
    }
}

fn wire_from(
    reader: tokio::net::unix::OwnedReadHalf,
    writer: tokio::net::unix::OwnedWriteHalf,
) -> Wire {
    Wire::from_parts(reader, writer)
}
