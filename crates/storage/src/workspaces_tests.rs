// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_core::iso_utc;

const T0: u64 = 1_700_000_000_000;

fn record(id: &str, task_id: &str, n: u64) -> WorkspaceRecord {
    WorkspaceRecord {
        id: id.to_string(),
        task_id: task_id.to_string(),
        path: format!("/work/{id}").into(),
        branch: format!("hub/{task_id}"),
        status: WorkspaceStatus::Active,
        created_at: iso_utc(T0 + n * 1_000),
    }
}

fn store(dir: &tempfile::TempDir) -> WorkspaceStore {
    WorkspaceStore::new(dir.path().join("workspaces.json"))
}

#[test]
fn register_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.register(record("ws-1", "t1", 1)).unwrap();

    let found = store.get("ws-1").unwrap().unwrap();
    assert_eq!(found.task_id, "t1");
    assert_eq!(found.status, WorkspaceStatus::Active);
    assert!(store.get("ws-9").unwrap().is_none());
}

#[test]
fn for_task_returns_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.register(record("ws-1", "t1", 1)).unwrap();
    store.register(record("ws-2", "t1", 5)).unwrap();
    store.register(record("ws-3", "t2", 3)).unwrap();

    let records = store.for_task("t1").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "ws-2");
}

#[test]
fn set_status_updates_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.register(record("ws-1", "t1", 1)).unwrap();

    store.set_status("ws-1", WorkspaceStatus::Released).unwrap();
    assert_eq!(
        store.get("ws-1").unwrap().unwrap().status,
        WorkspaceStatus::Released
    );

    assert!(store.set_status("ws-9", WorkspaceStatus::Failed).is_err());
}
