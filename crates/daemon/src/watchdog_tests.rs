// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};

#[test]
fn pulse_resets_staleness() {
    let watchdog = Watchdog::new();
    std::thread::sleep(Duration::from_millis(20));
    assert!(watchdog.since_last_pulse() >= Duration::from_millis(10));

    watchdog.pulse();
    assert!(watchdog.since_last_pulse() < Duration::from_millis(10));
}

#[tokio::test]
async fn monitor_restarts_a_stalled_task() {
    let watchdog = Watchdog::new();
    let restarts = Arc::new(AtomicU32::new(0));

    // A task that never pulses: it stalls immediately
    let stuck = tokio::spawn(async {
        std::future::pending::<()>().await;
    });

    let monitor = {
        let restarts = Arc::clone(&restarts);
        let watchdog_inner = watchdog.clone();
        watchdog.spawn_monitor("test-sweep", Duration::from_millis(50), stuck, move || {
            restarts.fetch_add(1, Ordering::SeqCst);
            // The replacement pulses, so only one restart happens
            let watchdog = watchdog_inner.clone();
            tokio::spawn(async move {
                loop {
                    watchdog.pulse();
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
        })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    monitor.abort();

    assert_eq!(restarts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn monitor_leaves_healthy_tasks_alone() {
    let watchdog = Watchdog::new();
    let restarts = Arc::new(AtomicU32::new(0));

    let healthy = {
        let watchdog = watchdog.clone();
        tokio::spawn(async move {
            loop {
                watchdog.pulse();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
    };

    let monitor = {
        let restarts = Arc::clone(&restarts);
        watchdog.spawn_monitor("test-sweep", Duration::from_millis(80), healthy, move || {
            restarts.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async {})
        })
    };

    tokio::time::sleep(Duration::from_millis(250)).await;
    monitor.abort();

    assert_eq!(restarts.load(Ordering::SeqCst), 0);
}
