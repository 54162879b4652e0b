// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_storage::accounts::AccountConfig;

const T0: u64 = 1_700_000_000_000;

#[test]
fn declared_accounts_seed_skills() {
    let accounts = AccountsFile {
        accounts: vec![AccountConfig {
            name: "alice".to_string(),
            skills: vec!["rust".to_string()],
            provider_type: Some("claude".to_string()),
        }],
    };
    let mut store = CapabilityStore::new();
    store.load_declared(&accounts);

    let record = store.get("alice").unwrap();
    assert_eq!(record.skills, vec!["rust"]);
    assert_eq!(record.provider_type.as_deref(), Some("claude"));
}

#[test]
fn record_delivery_tracks_running_average() {
    let mut store = CapabilityStore::new();
    store.record_delivery("alice", true, Some(100));
    store.record_delivery("alice", true, Some(300));

    let record = store.get("alice").unwrap();
    assert_eq!(record.total_tasks, 2);
    assert_eq!(record.accepted_tasks, 2);
    assert_eq!(record.avg_delivery_ms, Some(200));
}

#[test]
fn rejected_deliveries_count_separately() {
    let mut store = CapabilityStore::new();
    store.record_delivery("alice", true, None);
    store.record_delivery("alice", false, None);

    let record = store.get("alice").unwrap();
    assert_eq!(record.total_tasks, 2);
    assert_eq!(record.accepted_tasks, 1);
    assert_eq!(record.rejected_tasks, 1);
}

#[test]
fn touch_updates_recency() {
    let mut store = CapabilityStore::new();
    store.touch("alice", T0);
    assert_eq!(store.get("alice").unwrap().last_active_at, Some(T0));
}

#[test]
fn rebuild_from_board_counts_terminal_outcomes() {
    let mut board = TaskBoard::default();

    let mut accepted = Task::new("t1", "done", T0);
    accepted.start("alice", T0).unwrap();
    accepted.submit_for_review(None, T0 + 120_000).unwrap();
    accepted.accept(T0 + 180_000).unwrap();
    board.insert(accepted);

    let mut open = Task::new("t2", "open", T0);
    open.start("alice", T0).unwrap();
    board.insert(open);

    let mut store = CapabilityStore::new();
    store.rebuild_from_board(&board);

    let record = store.get("alice").unwrap();
    assert_eq!(record.total_tasks, 1, "open task must not count as delivered");
    assert_eq!(record.accepted_tasks, 1);
    assert_eq!(record.avg_delivery_ms, Some(180_000));
    assert!(record.last_active_at.is_some());
}

#[test]
fn all_is_sorted_by_account() {
    let mut store = CapabilityStore::new();
    store.ensure_account("zed");
    store.ensure_account("amy");
    let names: Vec<String> = store.all().into_iter().map(|r| r.account_name).collect();
    assert_eq!(names, vec!["amy", "zed"]);
}
