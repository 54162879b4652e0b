// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_core::{Task, TransitionError};

const T0: u64 = 1_700_000_000_000;

fn store(dir: &tempfile::TempDir) -> BoardStore {
    BoardStore::new(dir.path().join("tasks.json"))
}

#[test]
fn missing_file_loads_empty_board() {
    let dir = tempfile::tempdir().unwrap();
    let board = store(&dir).load().unwrap();
    assert!(board.tasks.is_empty());
}

#[test]
fn save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let mut board = TaskBoard::default();
    let mut task = Task::new("t1", "Fix the build", T0);
    task.start("alice", T0).unwrap();
    task.submit_for_review(None, T0).unwrap();
    task.reject("broken", 3, T0).unwrap();
    board.insert(task);
    board.insert(Task::new("t2", "Write docs", T0));

    store.save(&board).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, board);
}

#[test]
fn save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.save(&TaskBoard::default()).unwrap();

    assert!(dir.path().join("tasks.json").exists());
    assert!(!dir.path().join("tasks.tmp").exists());
    assert!(!dir.path().join("tasks.json.lock").exists());
}

#[test]
fn update_mutates_in_one_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    store
        .update(|board| -> Result<(), TransitionError> {
            board.insert(Task::new("t1", "Ship it", T0));
            Ok(())
        })
        .unwrap();

    store
        .update(|board| {
            let task = board.get_mut("t1").ok_or(TransitionError::EmptyReason)?;
            task.start("alice", T0)
        })
        .unwrap();

    let board = store.load().unwrap();
    assert_eq!(board.get("t1").unwrap().assignee.as_deref(), Some("alice"));
}

#[test]
fn update_op_error_aborts_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.save(&TaskBoard::default()).unwrap();

    let result = store.update(|board| {
        board.insert(Task::new("t1", "Doomed", T0));
        // A failing transition aborts the transaction
        board.get_mut("t1").map(|t| t.accept(T0)).transpose()?;
        Ok::<(), TransitionError>(())
    });
    assert!(matches!(result, Err(UpdateError::Op(_))));

    let board = store.load().unwrap();
    assert!(board.tasks.is_empty(), "aborted transaction must not persist");
}

#[test]
fn workloads_counts_wip_open_and_throughput() {
    let mut board = TaskBoard::default();

    // alice: one in_progress (wip+open), one todo assigned via revoke path
    let mut wip = Task::new("t1", "wip", T0);
    wip.start("alice", T0).unwrap();
    board.insert(wip);

    // alice: accepted 30 minutes ago counts toward throughput
    let mut fresh = Task::new("t2", "fresh accept", T0);
    fresh.start("alice", T0).unwrap();
    fresh.submit_for_review(None, T0).unwrap();
    fresh.accept(T0 + 30 * 60 * 1000).unwrap();
    board.insert(fresh);

    // alice: accepted two hours ago does not count
    let mut stale = Task::new("t3", "old accept", T0);
    stale.start("alice", T0).unwrap();
    stale.submit_for_review(None, T0).unwrap();
    stale.accept(T0).unwrap();
    board.insert(stale);

    // bob: ready_for_review is open but not wip
    let mut review = Task::new("t4", "in review", T0);
    review.start("bob", T0).unwrap();
    review.submit_for_review(None, T0).unwrap();
    board.insert(review);

    let now = T0 + 2 * 60 * 60 * 1000;
    let workloads = board.workloads(now);

    let alice = &workloads["alice"];
    assert_eq!(alice.wip_count, 1);
    assert_eq!(alice.open_count, 1);
    assert_eq!(alice.recent_throughput, 0, "accept at T0+30m is stale at T0+2h");

    let bob = &workloads["bob"];
    assert_eq!(bob.wip_count, 0);
    assert_eq!(bob.open_count, 1);
}

#[test]
fn workloads_throughput_within_window() {
    let mut board = TaskBoard::default();
    let mut task = Task::new("t1", "quick", T0);
    task.start("alice", T0).unwrap();
    task.submit_for_review(None, T0).unwrap();
    task.accept(T0 + 1_000).unwrap();
    board.insert(task);

    let workloads = board.workloads(T0 + 10 * 60 * 1000);
    assert_eq!(workloads["alice"].recent_throughput, 1);
    assert_eq!(workloads["alice"].open_count, 0);
}
