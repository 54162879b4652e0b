// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_core::iso_utc;

fn note(id: &str, title: &str, body: &str, tags: &[&str]) -> Note {
    Note {
        id: id.to_string(),
        account: "alice".to_string(),
        title: title.to_string(),
        body: body.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        indexed_at: iso_utc(1_700_000_000_000),
    }
}

fn store(dir: &tempfile::TempDir) -> KnowledgeStore {
    KnowledgeStore::new(dir.path().join("knowledge.json"))
}

#[test]
fn title_matches_outrank_body_matches() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    store
        .index(note("n1", "Retry strategy", "use exponential backoff", &[]))
        .unwrap();
    store
        .index(note("n2", "Deploy notes", "the retry queue is flaky", &[]))
        .unwrap();

    let results = store.search("retry", 10).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "n1", "title hit should rank first");
}

#[test]
fn tags_count_as_strong_matches() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store
        .index(note("n1", "Misc", "nothing relevant", &["sockets"]))
        .unwrap();

    let results = store.search("sockets", 10).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn unmatched_query_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.index(note("n1", "A", "B", &[])).unwrap();

    assert!(store.search("quantum", 10).unwrap().is_empty());
    assert!(store.search("", 10).unwrap().is_empty());
}

#[test]
fn limit_caps_results() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    for n in 0..5 {
        store
            .index(note(&format!("n{n}"), "socket handling", "details", &[]))
            .unwrap();
    }
    assert_eq!(store.search("socket", 2).unwrap().len(), 2);
}

#[test]
fn search_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store
        .index(note("n1", "Backpressure Handling", "drain timers", &[]))
        .unwrap();
    assert_eq!(store.search("BACKPRESSURE", 10).unwrap().len(), 1);
}
