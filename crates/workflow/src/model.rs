// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow definition and run models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel `assign` value meaning "ask the capability router".
pub const AUTO_ASSIGN: &str = "auto";

/// What to do when a step exhausts its retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    #[default]
    Notify,
    Retry,
    Abort,
}

/// The handoff contract a step sends to its assignee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepHandoff {
    pub goal: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
}

/// A gate expression deciding whether a step runs at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCondition {
    /// Boolean expression over `step.<id>.*` and `trigger.context`.
    pub when: String,
}

/// One step of a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Literal account name, or [`AUTO_ASSIGN`].
    #[serde(default = "default_assign")]
    pub assign: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<StepCondition>,
    pub handoff: StepHandoff,
}

fn default_assign() -> String {
    AUTO_ASSIGN.to_string()
}

/// A parsed workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(rename = "step")]
    pub steps: Vec<StepDef>,
    #[serde(default)]
    pub on_failure: OnFailure,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub retro: bool,
}

fn default_version() -> u32 {
    1
}

impl WorkflowDef {
    /// Look up a step definition by id.
    pub fn step(&self, id: &str) -> Option<&StepDef> {
        self.steps.iter().find(|s| s.id == id)
    }
}

/// Status of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    RetroInProgress,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::RetroInProgress => "retro_in_progress",
        };
        f.write_str(s)
    }
}

/// One execution of a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: String,
    pub workflow_name: String,
    pub status: RunStatus,
    #[serde(default)]
    pub trigger_context: serde_json::Value,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retro_id: Option<String>,
}

/// Status of one step run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRunStatus {
    Pending,
    Assigned,
    Completed,
    Failed,
    Skipped,
}

impl StepRunStatus {
    /// Terminal = {completed, failed, skipped}.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepRunStatus::Completed | StepRunStatus::Failed | StepRunStatus::Skipped
        )
    }
}

impl fmt::Display for StepRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepRunStatus::Pending => "pending",
            StepRunStatus::Assigned => "assigned",
            StepRunStatus::Completed => "completed",
            StepRunStatus::Failed => "failed",
            StepRunStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// One step's state within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRun {
    pub id: String,
    pub run_id: String,
    pub step_id: String,
    pub status: StepRunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl StepRun {
    /// Fresh pending step run.
    pub fn pending(id: impl Into<String>, run_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            run_id: run_id.into(),
            step_id: step_id.into(),
            status: StepRunStatus::Pending,
            assigned_to: None,
            started_at_ms: None,
            completed_at_ms: None,
            attempt: 1,
            result: None,
        }
    }

    /// Reset for a retry: back to pending, attempt bumped, slate cleared.
    pub fn reset_for_retry(&mut self) {
        self.status = StepRunStatus::Pending;
        self.attempt += 1;
        self.assigned_to = None;
        self.started_at_ms = None;
        self.completed_at_ms = None;
        self.result = None;
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
