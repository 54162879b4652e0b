// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the hub socket.
//!
//! Requests are `{"type": "<snake_case>", "requestId"?: "...", ...}` with
//! camelCase fields; replies echo the `requestId`. The `requestId` is
//! handled at the framing layer, so these types don't carry it.

use hub_core::{ErrorKind, HandoffPayload, TaskPriority, WorkspaceContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Requests accepted after (and including) authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Request {
    /// Handshake; must be the first frame on a connection.
    Auth { account: String, token: String },

    // -- health --
    Ping,
    HealthCheck,

    // -- analytics --
    GetAnalytics,

    // -- accounts --
    ListAccounts,

    /// Request daemon shutdown.
    Shutdown,

    // -- tasks --
    CreateTask {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<TaskPriority>,
    },
    ListTasks {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    GetTask {
        task_id: String,
    },
    UpdateTaskStatus {
        task_id: String,
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workspace_context: Option<WorkspaceContext>,
    },
    ReportProgress {
        task_id: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent: Option<u8>,
        /// Names a checkpoint; emits `CHECKPOINT_REACHED` alongside the
        /// progress update.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checkpoint: Option<String>,
    },
    AdaptiveSlaCheck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },
    GetTrust {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
    },
    ReinstateAgent {
        agent: String,
    },
    CheckCircuitBreaker {
        agent: String,
    },

    // -- messaging --
    SendMessage {
        to: String,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },
    CountUnread,
    ReadMessages {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },

    // -- handoff --
    HandoffTask {
        task_id: String,
        to: String,
        payload: HandoffPayload,
    },
    HandoffAccept {
        handoff_id: String,
    },

    // -- workspace --
    PrepareWorktreeForHandoff {
        task_id: String,
        branch: String,
    },
    GetWorkspaceStatus {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workspace_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },
    CleanupWorkspace {
        workspace_id: String,
    },

    // -- routing --
    SuggestAssignee {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        skills: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        exclude: Vec<String>,
    },

    // -- knowledge --
    SearchKnowledge {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
    IndexNote {
        title: String,
        body: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
    },

    // -- streaming --
    Subscribe {
        patterns: Vec<String>,
    },
    Unsubscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        patterns: Option<Vec<String>>,
    },

    // -- workflow --
    TriggerWorkflow {
        workflow: String,
        #[serde(default)]
        context: Value,
    },
    CompleteWorkflowStep {
        run_id: String,
        step_id: String,
        /// `accepted`, `rejected`, or `failed`.
        result: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    CancelWorkflow {
        run_id: String,
    },
    GetWorkflowRun {
        run_id: String,
    },
}

/// Replies. `requestId` is injected by the framing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    AuthOk,
    AuthFail {
        error: String,
    },
    Result {
        #[serde(flatten)]
        data: Value,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
}

impl Response {
    /// A `result` reply; `data` should be a JSON object.
    pub fn result(data: Value) -> Self {
        Response::Result { data }
    }

    /// Plain error with a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
            details: None,
        }
    }

    /// Error tagged with one of the daemon's error kinds.
    pub fn error_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
            details: Some(serde_json::json!({ "kind": kind.as_str() })),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
