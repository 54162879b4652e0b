// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unknown_agent_created_at_baseline() {
    let mut store = TrustStore::new();
    assert!(store.get("alice").is_none());

    let delta = store.record_outcome("alice", TaskOutcome::Completed, None);
    assert_eq!(delta, TrustDelta { delta: 2, score: 52 });

    let record = store.get("alice").unwrap();
    assert_eq!(record.completed_count, 1);
}

#[test]
fn outcomes_accumulate() {
    let mut store = TrustStore::new();
    store.record_outcome("alice", TaskOutcome::Completed, Some(2)); // +3 → 53
    store.record_outcome("alice", TaskOutcome::Failed, None); // -5 → 48
    store.record_outcome("alice", TaskOutcome::Rejected, None); // -3 → 45

    assert_eq!(store.score("alice"), Some(45));
    let record = store.get("alice").unwrap();
    assert_eq!(
        (record.completed_count, record.failed_count, record.rejected_count),
        (1, 1, 1)
    );
}

#[test]
fn zero_delta_at_floor_signals_no_change() {
    let mut store = TrustStore::new();
    // Ten failures drive the score to the floor
    for _ in 0..10 {
        store.record_outcome("flaky", TaskOutcome::Failed, None);
    }
    assert_eq!(store.score("flaky"), Some(0));

    let delta = store.record_outcome("flaky", TaskOutcome::Failed, None);
    assert_eq!(delta.delta, 0, "no TRUST_UPDATE should be emitted");
}

#[test]
fn all_returns_records_sorted_by_agent() {
    let mut store = TrustStore::new();
    store.record_outcome("zed", TaskOutcome::Completed, None);
    store.record_outcome("amy", TaskOutcome::Completed, None);

    let agents: Vec<&str> = store.all().iter().map(|r| r.agent.as_str()).collect();
    assert_eq!(agents, vec!["amy", "zed"]);
}
