// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task model and state machine.

use crate::time_fmt::{iso_utc, parse_iso_ms};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// How many rejections force a task to `needs_review`.
pub const DEFAULT_REJECTION_ESCALATION_THRESHOLD: u32 = 3;

/// Status of a task on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    ReadyForReview,
    Accepted,
    Rejected,
    NeedsReview,
}

impl TaskStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Accepted | TaskStatus::Rejected)
    }

    /// Open = counted toward an agent's workload.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::ReadyForReview => "ready_for_review",
            TaskStatus::Accepted => "accepted",
            TaskStatus::Rejected => "rejected",
            TaskStatus::NeedsReview => "needs_review",
        };
        f.write_str(s)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Where the work for a submitted task lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceContext {
    pub workspace_path: PathBuf,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

/// An entry in a task's event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TaskEvent {
    StatusChanged {
        timestamp: String,
        from: TaskStatus,
        to: TaskStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ReviewRejected {
        timestamp: String,
        reason: String,
    },
    ReviewAccepted {
        timestamp: String,
    },
    Escalated {
        timestamp: String,
        reason: String,
    },
    Revoked {
        timestamp: String,
        reason: String,
    },
    Progress {
        timestamp: String,
        message: String,
    },
}

impl TaskEvent {
    pub fn timestamp(&self) -> &str {
        match self {
            TaskEvent::StatusChanged { timestamp, .. }
            | TaskEvent::ReviewRejected { timestamp, .. }
            | TaskEvent::ReviewAccepted { timestamp }
            | TaskEvent::Escalated { timestamp, .. }
            | TaskEvent::Revoked { timestamp, .. }
            | TaskEvent::Progress { timestamp, .. } => timestamp,
        }
    }
}

/// Errors from illegal state-machine operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} a task in status {from}")]
    InvalidTransition { from: TaskStatus, action: &'static str },

    #[error("reject requires a non-empty reason")]
    EmptyReason,
}

/// Result of a reject transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectOutcome {
    /// True when the rejection tripped the escalation threshold and the task
    /// moved to `needs_review` instead of back to `in_progress`.
    pub escalated: bool,
    pub rejection_count: u32,
}

/// A task on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub events: Vec<TaskEvent>,
    #[serde(default)]
    pub rejection_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_context: Option<WorkspaceContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Task {
    /// Create a new task in `todo`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: TaskStatus::Todo,
            assignee: None,
            created_at: iso_utc(now_ms),
            events: Vec::new(),
            rejection_count: 0,
            tags: Vec::new(),
            priority: TaskPriority::default(),
            workspace_context: None,
            description: None,
        }
    }

    fn transition(&mut self, to: TaskStatus, reason: Option<String>, now_ms: u64) {
        let from = self.status;
        self.status = to;
        self.events.push(TaskEvent::StatusChanged {
            timestamp: iso_utc(now_ms),
            from,
            to,
            reason,
        });
    }

    /// `todo` / `needs_review` → `in_progress`.
    pub fn start(&mut self, agent: &str, now_ms: u64) -> Result<(), TransitionError> {
        match self.status {
            TaskStatus::Todo | TaskStatus::NeedsReview => {
                self.assignee = Some(agent.to_string());
                self.transition(TaskStatus::InProgress, None, now_ms);
                Ok(())
            }
            from => Err(TransitionError::InvalidTransition {
                from,
                action: "start",
            }),
        }
    }

    /// `in_progress` → `ready_for_review`, optionally recording where the
    /// work lives.
    pub fn submit_for_review(
        &mut self,
        workspace: Option<WorkspaceContext>,
        now_ms: u64,
    ) -> Result<(), TransitionError> {
        match self.status {
            TaskStatus::InProgress => {
                if workspace.is_some() {
                    self.workspace_context = workspace;
                }
                self.transition(TaskStatus::ReadyForReview, None, now_ms);
                Ok(())
            }
            from => Err(TransitionError::InvalidTransition {
                from,
                action: "submit",
            }),
        }
    }

    /// `ready_for_review` / `needs_review` → `accepted` (terminal).
    pub fn accept(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        match self.status {
            TaskStatus::ReadyForReview | TaskStatus::NeedsReview => {
                self.transition(TaskStatus::Accepted, None, now_ms);
                self.events.push(TaskEvent::ReviewAccepted {
                    timestamp: iso_utc(now_ms),
                });
                Ok(())
            }
            from => Err(TransitionError::InvalidTransition {
                from,
                action: "accept",
            }),
        }
    }

    /// `ready_for_review` → `in_progress` with the rejection counter bumped.
    ///
    /// When the counter reaches `threshold` the task lands in `needs_review`
    /// instead and an `escalated` event is recorded; the counter freezes for
    /// that run because further rejects are only reachable after a review
    /// cycle re-enters `ready_for_review`.
    pub fn reject(
        &mut self,
        reason: &str,
        threshold: u32,
        now_ms: u64,
    ) -> Result<RejectOutcome, TransitionError> {
        if reason.trim().is_empty() {
            return Err(TransitionError::EmptyReason);
        }
        match self.status {
            TaskStatus::ReadyForReview => {
                self.rejection_count += 1;
                self.events.push(TaskEvent::ReviewRejected {
                    timestamp: iso_utc(now_ms),
                    reason: reason.to_string(),
                });

                let escalated = self.rejection_count >= threshold;
                if escalated {
                    let escalation_reason = format!("Rejected {} times", self.rejection_count);
                    self.transition(
                        TaskStatus::NeedsReview,
                        Some(escalation_reason.clone()),
                        now_ms,
                    );
                    self.events.push(TaskEvent::Escalated {
                        timestamp: iso_utc(now_ms),
                        reason: escalation_reason,
                    });
                } else {
                    self.transition(TaskStatus::InProgress, Some(reason.to_string()), now_ms);
                }

                Ok(RejectOutcome {
                    escalated,
                    rejection_count: self.rejection_count,
                })
            }
            from => Err(TransitionError::InvalidTransition {
                from,
                action: "reject",
            }),
        }
    }

    /// Pull an in-flight task back to `todo` (circuit-breaker revocation).
    pub fn revoke(&mut self, reason: &str, now_ms: u64) -> Result<(), TransitionError> {
        match self.status {
            TaskStatus::InProgress => {
                self.assignee = None;
                self.events.push(TaskEvent::Revoked {
                    timestamp: iso_utc(now_ms),
                    reason: reason.to_string(),
                });
                self.transition(TaskStatus::Todo, Some(reason.to_string()), now_ms);
                Ok(())
            }
            from => Err(TransitionError::InvalidTransition {
                from,
                action: "revoke",
            }),
        }
    }

    /// Record a progress note without changing status.
    pub fn record_progress(&mut self, message: &str, now_ms: u64) {
        self.events.push(TaskEvent::Progress {
            timestamp: iso_utc(now_ms),
            message: message.to_string(),
        });
    }

    /// Epoch ms when the task last entered its current status.
    ///
    /// Falls back to `created_at` for tasks that never transitioned.
    /// Staleness ("stale" in the SLA engine) is measured from this point.
    pub fn entered_status_ms(&self) -> Option<u64> {
        let last_change = self.events.iter().rev().find_map(|ev| match ev {
            TaskEvent::StatusChanged { timestamp, to, .. } if *to == self.status => {
                Some(timestamp.as_str())
            }
            _ => None,
        });
        match last_change {
            Some(ts) => parse_iso_ms(ts),
            None => parse_iso_ms(&self.created_at),
        }
    }

    /// Epoch ms when the task last entered `in_progress`, if it ever did.
    ///
    /// Used to compute delivery duration for trust accounting.
    pub fn entered_in_progress_ms(&self) -> Option<u64> {
        self.events.iter().rev().find_map(|ev| match ev {
            TaskEvent::StatusChanged { timestamp, to, .. }
                if *to == TaskStatus::InProgress =>
            {
                parse_iso_ms(timestamp)
            }
            _ => None,
        })
    }

    /// Epoch ms of the most recent `accepted` transition, if any.
    pub fn accepted_at_ms(&self) -> Option<u64> {
        self.events.iter().rev().find_map(|ev| match ev {
            TaskEvent::StatusChanged { timestamp, to, .. } if *to == TaskStatus::Accepted => {
                parse_iso_ms(timestamp)
            }
            _ => None,
        })
    }

    /// Whether the task carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
