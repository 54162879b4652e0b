// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classic SLA engine: wall-clock staleness sweep over the board.
//!
//! "Stale" is measured from the `status_changed` event that entered the
//! task's current status. Tasks tagged `blocked` get the blocked budget
//! instead of the in-progress one.

pub mod adaptive;

use hub_core::{Task, TaskStatus};
use hub_storage::TaskBoard;
use std::time::Duration;

/// Tag marking a task as blocked on something external.
pub const BLOCKED_TAG: &str = "blocked";

/// Staleness budgets.
#[derive(Debug, Clone)]
pub struct SlaConfig {
    pub in_progress_max: Duration,
    pub blocked_max: Duration,
    pub review_max: Duration,
    /// Sweep cadence (driven by the daemon's timer).
    pub check_interval: Duration,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            in_progress_max: Duration::from_secs(30 * 60),
            blocked_max: Duration::from_secs(2 * 60 * 60),
            review_max: Duration::from_secs(60 * 60),
            check_interval: Duration::from_secs(60),
        }
    }
}

/// Action produced by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaAction {
    Ping,
    ReassignSuggestion,
    Escalate,
}

impl SlaAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaAction::Ping => "ping",
            SlaAction::ReassignSuggestion => "reassign_suggestion",
            SlaAction::Escalate => "escalate",
        }
    }
}

/// One stale task found by the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaFinding {
    pub task_id: String,
    pub status: TaskStatus,
    pub action: SlaAction,
    pub stale_ms: u64,
}

/// Sweep the board for stale tasks.
pub fn check_board(board: &TaskBoard, now_ms: u64, config: &SlaConfig) -> Vec<SlaFinding> {
    board
        .tasks
        .values()
        .filter_map(|task| check_task(task, now_ms, config))
        .collect()
}

fn check_task(task: &Task, now_ms: u64, config: &SlaConfig) -> Option<SlaFinding> {
    let entered = task.entered_status_ms()?;
    let stale_ms = now_ms.saturating_sub(entered);
    let blocked = task.has_tag(BLOCKED_TAG);

    let action = match task.status {
        TaskStatus::InProgress if blocked => {
            (stale_ms > config.blocked_max.as_millis() as u64).then_some(SlaAction::Escalate)?
        }
        TaskStatus::InProgress => {
            let budget = config.in_progress_max.as_millis() as u64;
            if stale_ms > 2 * budget {
                SlaAction::ReassignSuggestion
            } else if stale_ms > budget {
                SlaAction::Ping
            } else {
                return None;
            }
        }
        TaskStatus::ReadyForReview => {
            (stale_ms > config.review_max.as_millis() as u64).then_some(SlaAction::Ping)?
        }
        _ => return None,
    };

    Some(SlaFinding {
        task_id: task.id.clone(),
        status: task.status,
        action,
        stale_ms,
    })
}

#[cfg(test)]
#[path = "sla_tests.rs"]
mod tests;
