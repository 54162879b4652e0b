// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent trust records.

use serde::{Deserialize, Serialize};

/// Score given to an agent the first time an outcome is recorded for it.
pub const BASELINE_TRUST: i32 = 50;

/// Delta applied for a completed task.
const COMPLETED_DELTA: i32 = 2;
/// Bonus delta for a fast completion (under [`FAST_DELIVERY_MINUTES`]).
const FAST_COMPLETED_DELTA: i32 = 3;
/// Completions faster than this earn the bonus delta.
const FAST_DELIVERY_MINUTES: u64 = 5;
/// Delta applied for a rejected task.
const REJECTED_DELTA: i32 = -3;
/// Delta applied for a failed task.
const FAILED_DELTA: i32 = -5;

/// Outcome of a task run, as seen by trust accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed,
    Failed,
    Rejected,
}

/// Trust standing of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustRecord {
    pub agent: String,
    /// Bounded to `[0, 100]`.
    pub trust_score: i32,
    pub completed_count: u32,
    pub failed_count: u32,
    pub rejected_count: u32,
}

impl TrustRecord {
    /// Fresh record at the neutral baseline.
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            trust_score: BASELINE_TRUST,
            completed_count: 0,
            failed_count: 0,
            rejected_count: 0,
        }
    }

    /// Apply one outcome, returning the delta actually applied after clamping.
    ///
    /// Schedule: completed +2 (+3 when delivered in under 5 minutes),
    /// rejected −3, failed −5.
    pub fn apply_outcome(&mut self, outcome: TaskOutcome, duration_minutes: Option<u64>) -> i32 {
        let delta = match outcome {
            TaskOutcome::Completed => {
                self.completed_count += 1;
                match duration_minutes {
                    Some(mins) if mins < FAST_DELIVERY_MINUTES => FAST_COMPLETED_DELTA,
                    _ => COMPLETED_DELTA,
                }
            }
            TaskOutcome::Rejected => {
                self.rejected_count += 1;
                REJECTED_DELTA
            }
            TaskOutcome::Failed => {
                self.failed_count += 1;
                FAILED_DELTA
            }
        };

        let before = self.trust_score;
        self.trust_score = (self.trust_score + delta).clamp(0, 100);
        self.trust_score - before
    }
}

#[cfg(test)]
#[path = "trust_tests.rs"]
mod tests;
