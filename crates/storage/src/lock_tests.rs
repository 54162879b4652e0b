// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn acquire_creates_and_drop_releases() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("tasks.json");

    let lock = DirLock::acquire(&target, DEFAULT_LOCK_TTL, Duration::from_millis(100)).unwrap();
    let lock_dir = dir.path().join("tasks.json.lock");
    assert!(lock_dir.exists());

    drop(lock);
    assert!(!lock_dir.exists());
}

#[test]
fn second_acquire_times_out_while_held() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("tasks.json");

    let _held = DirLock::acquire(&target, DEFAULT_LOCK_TTL, Duration::from_millis(100)).unwrap();
    let err = DirLock::acquire(&target, DEFAULT_LOCK_TTL, Duration::from_millis(50)).unwrap_err();
    assert!(matches!(err, LockError::Timeout(_)));
}

#[test]
fn stale_lock_is_broken_after_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("tasks.json");

    // Simulate an abandoned lock from a crashed holder
    std::fs::create_dir(dir.path().join("tasks.json.lock")).unwrap();

    // TTL of zero means any existing lock is stale
    let lock = DirLock::acquire(&target, Duration::from_millis(0), Duration::from_millis(200))
        .unwrap();
    drop(lock);
    assert!(!dir.path().join("tasks.json.lock").exists());
}

#[test]
fn sequential_acquires_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("tasks.json");

    for _ in 0..3 {
        let lock =
            DirLock::acquire(&target, DEFAULT_LOCK_TTL, Duration::from_millis(100)).unwrap();
        drop(lock);
    }
}
