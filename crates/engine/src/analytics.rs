// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Board and trust analytics for the `get_analytics` surface.

use crate::trust::TrustStore;
use hub_core::{TaskStatus, TrustRecord};
use hub_storage::TaskBoard;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-agent delivery counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub accepted: u32,
    pub rejected: u32,
    pub in_progress: u32,
}

/// Snapshot answered to `get_analytics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// Task counts keyed by status string.
    pub status_counts: BTreeMap<String, usize>,
    pub agents: BTreeMap<String, AgentStats>,
    /// Tasks accepted in the last 60 minutes, across all agents.
    pub accepted_last_hour: u32,
    pub trust: Vec<TrustRecord>,
}

/// Compute analytics from the board and trust store.
pub fn compute_analytics(board: &TaskBoard, trust: &TrustStore, now_ms: u64) -> Analytics {
    let mut analytics = Analytics::default();

    for task in board.tasks.values() {
        *analytics
            .status_counts
            .entry(task.status.to_string())
            .or_insert(0) += 1;

        if let Some(agent) = task.assignee.as_deref() {
            let stats = analytics.agents.entry(agent.to_string()).or_default();
            match task.status {
                TaskStatus::Accepted => stats.accepted += 1,
                TaskStatus::Rejected => stats.rejected += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                _ => {}
            }
        }
    }

    for workload in board.workloads(now_ms).values() {
        analytics.accepted_last_hour += workload.recent_throughput;
    }

    analytics.trust = trust.all().into_iter().cloned().collect();
    analytics
}

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod tests;
