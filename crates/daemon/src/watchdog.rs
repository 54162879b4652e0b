// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog for the daemon's periodic tasks.
//!
//! Monitored tasks pulse a shared beat; the monitor restarts a task whose
//! beat goes stale (stuck timer, panicked task).

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Heartbeat shared between a monitored task and its watchdog.
#[derive(Clone)]
pub struct Watchdog {
    beat: Arc<Mutex<Instant>>,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    pub fn new() -> Self {
        Self {
            beat: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Called by the monitored task on every healthy iteration.
    pub fn pulse(&self) {
        *self.beat.lock() = Instant::now();
    }

    /// Time since the last pulse.
    pub fn since_last_pulse(&self) -> Duration {
        self.beat.lock().elapsed()
    }

    /// Spawn a monitor that restarts the task when the beat stalls.
    ///
    /// `restart` must spawn a fresh instance of the monitored task and
    /// return its handle; the stalled instance is aborted first.
    pub fn spawn_monitor<F>(
        &self,
        name: &'static str,
        stall_after: Duration,
        initial: tokio::task::JoinHandle<()>,
        restart: F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Fn() -> tokio::task::JoinHandle<()> + Send + 'static,
    {
        let watchdog = self.clone();
        tokio::spawn(async move {
            let mut current = initial;
            let mut interval = tokio::time::interval(stall_after / 2);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if watchdog.since_last_pulse() <= stall_after {
                    continue;
                }
                warn!(task = name, "periodic task stalled; restarting");
                current.abort();
                watchdog.pulse();
                current = restart();
                info!(task = name, "periodic task restarted");
            }
        })
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
