// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker: quarantines agents that keep failing.

use hub_core::TaskStatus;
use hub_storage::TaskBoard;
use std::collections::HashMap;
use std::time::Duration;

/// Breaker tuning.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Failures within the window that trip the breaker.
    pub failure_threshold: u32,
    /// Sliding window for counting failures.
    pub window: Duration,
    /// How long a tripped agent stays quarantined.
    pub quarantine: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            window: Duration::from_secs(10 * 60),
            quarantine: Duration::from_secs(30 * 60),
        }
    }
}

/// An active quarantine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quarantine {
    pub agent: String,
    pub until_ms: u64,
    pub reason: String,
}

/// Per-agent failure tracking and quarantine state.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    failures: HashMap<String, Vec<u64>>,
    quarantined: HashMap<String, Quarantine>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            failures: HashMap::new(),
            quarantined: HashMap::new(),
        }
    }

    /// Record one failure. Returns the quarantine if this trips the breaker.
    ///
    /// Failures already inside a quarantine window are ignored.
    pub fn record_failure(&mut self, agent: &str, now_ms: u64) -> Option<Quarantine> {
        if self.is_quarantined(agent, now_ms) {
            return None;
        }

        let window_ms = self.config.window.as_millis() as u64;
        let stamps = self.failures.entry(agent.to_string()).or_default();
        stamps.push(now_ms);
        stamps.retain(|&at| now_ms.saturating_sub(at) <= window_ms);

        if stamps.len() as u32 >= self.config.failure_threshold {
            let reason = format!(
                "{} failures within {}m",
                stamps.len(),
                self.config.window.as_secs() / 60
            );
            let quarantine = Quarantine {
                agent: agent.to_string(),
                until_ms: now_ms + self.config.quarantine.as_millis() as u64,
                reason,
            };
            self.quarantined
                .insert(agent.to_string(), quarantine.clone());
            self.failures.remove(agent);
            return Some(quarantine);
        }
        None
    }

    /// Whether an agent is currently quarantined. Expired entries lapse.
    pub fn is_quarantined(&self, agent: &str, now_ms: u64) -> bool {
        self.quarantined
            .get(agent)
            .map(|q| q.until_ms > now_ms)
            .unwrap_or(false)
    }

    /// The active quarantine record, if any.
    pub fn quarantine(&self, agent: &str, now_ms: u64) -> Option<&Quarantine> {
        self.quarantined
            .get(agent)
            .filter(|q| q.until_ms > now_ms)
    }

    /// Accounts excluded from routing right now.
    pub fn quarantined_accounts(&self, now_ms: u64) -> Vec<String> {
        let mut accounts: Vec<String> = self
            .quarantined
            .values()
            .filter(|q| q.until_ms > now_ms)
            .map(|q| q.agent.clone())
            .collect();
        accounts.sort_unstable();
        accounts
    }

    /// Clear an agent's quarantine and failure history.
    ///
    /// Returns true when there was anything to clear.
    pub fn reinstate(&mut self, agent: &str) -> bool {
        let had_quarantine = self.quarantined.remove(agent).is_some();
        let had_failures = self.failures.remove(agent).is_some();
        had_quarantine || had_failures
    }
}

/// Revoke all in-flight tasks assigned to a quarantined agent.
///
/// Returns the revoked task ids. Mutates the board in place; the caller
/// persists it and emits `CIRCUIT_BREAKER_OPEN`.
pub fn revoke_in_flight(board: &mut TaskBoard, agent: &str, reason: &str, now_ms: u64) -> Vec<String> {
    let ids: Vec<String> = board
        .tasks
        .values()
        .filter(|t| t.status == TaskStatus::InProgress && t.assignee.as_deref() == Some(agent))
        .map(|t| t.id.clone())
        .collect();

    for id in &ids {
        if let Some(task) = board.get_mut(id) {
            // revoke() only fails for non-in_progress tasks, filtered above
            let _ = task.revoke(reason, now_ms);
        }
    }
    ids
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
