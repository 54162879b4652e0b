// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trust store: per-agent scores updated from task outcomes.

use hub_core::{TaskOutcome, TrustRecord};
use std::collections::BTreeMap;

/// Result of recording one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustDelta {
    /// Movement actually applied (post-clamp). Zero when the score was
    /// already pinned at a bound.
    pub delta: i32,
    /// Score after the update.
    pub score: i32,
}

/// In-memory trust store.
///
/// Single-threaded writer discipline: the daemon serializes access through
/// one `Arc<Mutex<TrustStore>>`.
#[derive(Debug, Default)]
pub struct TrustStore {
    records: BTreeMap<String, TrustRecord>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome, creating the record at baseline 50 on first sight.
    ///
    /// Callers should emit `TRUST_UPDATE` only when `delta != 0`.
    pub fn record_outcome(
        &mut self,
        agent: &str,
        outcome: TaskOutcome,
        duration_minutes: Option<u64>,
    ) -> TrustDelta {
        let record = self
            .records
            .entry(agent.to_string())
            .or_insert_with(|| TrustRecord::new(agent));
        let delta = record.apply_outcome(outcome, duration_minutes);
        TrustDelta {
            delta,
            score: record.trust_score,
        }
    }

    pub fn get(&self, agent: &str) -> Option<&TrustRecord> {
        self.records.get(agent)
    }

    /// Current score for an agent, if known.
    pub fn score(&self, agent: &str) -> Option<i32> {
        self.records.get(agent).map(|r| r.trust_score)
    }

    /// All records, in agent-name order.
    pub fn all(&self) -> Vec<&TrustRecord> {
        self.records.values().collect()
    }
}

#[cfg(test)]
#[path = "trust_tests.rs"]
mod tests;
