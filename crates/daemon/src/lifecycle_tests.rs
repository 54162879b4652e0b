// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn config_paths_root_at_hub_dir() {
    let config = Config::for_dir("/tmp/hub-test");
    assert_eq!(config.socket_path, PathBuf::from("/tmp/hub-test/hub.sock"));
    assert_eq!(config.pid_path, PathBuf::from("/tmp/hub-test/daemon.pid"));
    assert_eq!(config.tokens_dir, PathBuf::from("/tmp/hub-test/tokens"));
    assert_eq!(config.tasks_path, PathBuf::from("/tmp/hub-test/tasks.json"));
    assert_eq!(
        config.events_path,
        PathBuf::from("/tmp/hub-test/events.ndjson")
    );
    assert_eq!(config.rejection_escalation_threshold, 3);
}

#[test]
fn features_default_all_on() {
    let features = Features::default();
    assert!(features.streaming);
    assert!(features.auto_acceptance);
    assert!(features.workflow);
    assert!(features.reliability);
}

#[tokio::test]
async fn startup_creates_lifecycle_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());

    let startup = startup(config.clone(), Features::default(), ExternalDeps::default())
        .await
        .unwrap();

    assert!(config.socket_path.exists());
    let pid = std::fs::read_to_string(&config.pid_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert!(config.workflows_dir.exists());

    let mut daemon = startup.spawn();
    daemon.shutdown();

    assert!(!config.socket_path.exists(), "shutdown removes the socket");
    assert!(!config.pid_path.exists(), "shutdown removes the pid file");
}

#[tokio::test]
async fn second_daemon_fails_to_lock() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());

    let first = startup(config.clone(), Features::default(), ExternalDeps::default())
        .await
        .unwrap();

    let second = startup(config.clone(), Features::default(), ExternalDeps::default()).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));

    // The running daemon's files survive the failed second startup
    assert!(config.pid_path.exists());

    let mut daemon = first.spawn();
    daemon.shutdown();
}

#[tokio::test]
async fn stale_socket_is_replaced_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());
    std::fs::create_dir_all(&config.hub_dir).unwrap();
    std::fs::write(&config.socket_path, "stale").unwrap();

    let startup = startup(config.clone(), Features::default(), ExternalDeps::default())
        .await
        .unwrap();
    let mut daemon = startup.spawn();

    // Bound socket replaced the stale file; a client can connect
    let stream = tokio::net::UnixStream::connect(&config.socket_path).await;
    assert!(stream.is_ok());

    daemon.shutdown();
}

#[tokio::test]
async fn events_flow_to_the_durable_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());

    let startup = startup(config.clone(), Features::default(), ExternalDeps::default())
        .await
        .unwrap();
    let ctx = Arc::clone(&startup.ctx);
    let mut daemon = startup.spawn();

    ctx.bus.emit(Event::TaskStarted {
        task_id: "t1".to_string(),
        agent: "alice".to_string(),
    });

    let entries = ctx
        .event_log
        .query(&hub_storage::EventQuery::default())
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event.type_name(), "TASK_STARTED");

    daemon.shutdown();
}
