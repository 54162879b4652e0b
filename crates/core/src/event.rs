// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event taxonomy for the hub.
//!
//! Events serialize with `{"type": "TASK_STARTED", ...fields}` format; field
//! names are camelCase on the wire. The taxonomy is closed: adding a type
//! means extending this enum, and (where persisted) the event-log query
//! prefix patterns keep working because the tag is the pattern subject.

use serde::{Deserialize, Serialize};

/// Which std stream a forwarded output line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Receipt recorded when a task's acceptance suite has been run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReceipt {
    pub task_id: String,
    pub delegator: String,
    pub delegatee: String,
    /// SHA-256 of the handoff payload the verdict applies to.
    pub spec_payload_hash: String,
    /// `"passed"` or `"failed"`.
    pub verdict: String,
    pub method: String,
    pub timestamp: String,
}

/// Events flowing through the bus, the stream, and the durable log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Event {
    // -- task lifecycle --
    #[serde(rename = "TASK_CREATED")]
    TaskCreated {
        task_id: String,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
    },

    #[serde(rename = "TASK_STARTED")]
    TaskStarted { task_id: String, agent: String },

    #[serde(rename = "TASK_SUBMITTED")]
    TaskSubmitted {
        task_id: String,
        agent: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },

    #[serde(rename = "TASK_ACCEPTED")]
    TaskAccepted {
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
    },

    #[serde(rename = "TASK_REJECTED")]
    TaskRejected {
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        reason: String,
    },

    #[serde(rename = "TASK_ESCALATED")]
    TaskEscalated { task_id: String, reason: String },

    #[serde(rename = "TASK_REVOKED")]
    TaskRevoked {
        task_id: String,
        agent: String,
        reason: String,
    },

    #[serde(rename = "TASK_VERIFIED")]
    TaskVerified {
        receipt: VerificationReceipt,
        passed: bool,
    },

    // -- agent output streaming --
    #[serde(rename = "AGENT_STREAM_STARTED")]
    AgentStreamStarted {
        agent: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },

    #[serde(rename = "AGENT_STREAM_CHUNK")]
    AgentStreamChunk {
        agent: String,
        stream: StreamKind,
        content: String,
    },

    #[serde(rename = "AGENT_STREAM_ENDED")]
    AgentStreamEnded { agent: String },

    // -- delegation --
    #[serde(rename = "DELEGATION_REQUESTED")]
    DelegationRequested {
        handoff_id: String,
        task_id: String,
        from: String,
        to: String,
    },

    #[serde(rename = "DELEGATION_ACCEPTED")]
    DelegationAccepted { handoff_id: String, to: String },

    #[serde(rename = "DELEGATION_CHAIN")]
    DelegationChain {
        task_id: String,
        chain: Vec<String>,
        depth: u32,
    },

    // -- council --
    #[serde(rename = "COUNCIL_STARTED")]
    CouncilStarted {
        topic: String,
        participants: Vec<String>,
    },

    #[serde(rename = "COUNCIL_COMPLETED")]
    CouncilCompleted { topic: String, verdict: String },

    // -- workflow --
    #[serde(rename = "WORKFLOW_STARTED")]
    WorkflowStarted { run_id: String, workflow: String },

    #[serde(rename = "WORKFLOW_STEP_STARTED")]
    WorkflowStepStarted {
        run_id: String,
        step_id: String,
        assigned_to: String,
    },

    #[serde(rename = "WORKFLOW_STEP_COMPLETED")]
    WorkflowStepCompleted {
        run_id: String,
        step_id: String,
        result: String,
        duration_ms: u64,
    },

    #[serde(rename = "WORKFLOW_STEP_FAILED")]
    WorkflowStepFailed {
        run_id: String,
        step_id: String,
        error: String,
        attempt: u32,
        will_retry: bool,
    },

    #[serde(rename = "WORKFLOW_COMPLETED")]
    WorkflowCompleted { run_id: String, status: String },

    #[serde(rename = "WORKFLOW_CANCELLED")]
    WorkflowCancelled { run_id: String },

    // -- acceptance suite streaming --
    #[serde(rename = "TDD_RUN_STARTED")]
    TddRunStarted {
        task_id: String,
        commands: Vec<String>,
    },

    #[serde(rename = "TDD_TEST_OUTPUT")]
    TddTestOutput {
        task_id: String,
        command: String,
        stream: StreamKind,
        line: String,
    },

    #[serde(rename = "TDD_RUN_COMPLETED")]
    TddRunCompleted { task_id: String, passed: bool },

    // -- SLA / resources --
    #[serde(rename = "SLA_WARNING")]
    SlaWarning {
        task_id: String,
        trigger: String,
        action: String,
    },

    #[serde(rename = "SLA_BREACH")]
    SlaBreach {
        task_id: String,
        trigger: String,
        action: String,
    },

    #[serde(rename = "RESOURCE_WARNING")]
    ResourceWarning {
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        trigger: String,
        detail: String,
    },

    #[serde(rename = "TRUST_UPDATE")]
    TrustUpdate {
        agent: String,
        delta: i32,
        score: i32,
        reason: String,
    },

    #[serde(rename = "CIRCUIT_BREAKER_OPEN")]
    CircuitBreakerOpen {
        agent: String,
        trigger: String,
        reason: String,
        revoked_task_ids: Vec<String>,
    },

    #[serde(rename = "CIRCUIT_BREAKER_CLOSED")]
    CircuitBreakerClosed { agent: String },

    #[serde(rename = "PROGRESS_UPDATE")]
    ProgressUpdate {
        task_id: String,
        agent: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent: Option<u8>,
    },

    #[serde(rename = "CHECKPOINT_REACHED")]
    CheckpointReached {
        task_id: String,
        agent: String,
        label: String,
    },

    #[serde(rename = "REASSIGNMENT")]
    Reassignment {
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
        reason: String,
    },

    #[serde(rename = "ACCOUNT_HEALTH")]
    AccountHealth {
        account: String,
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl Event {
    /// The wire tag of this event (`"TASK_STARTED"`, …).
    ///
    /// Must agree with the serde renames above; subscription patterns match
    /// against this string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::TaskCreated { .. } => "TASK_CREATED",
            Event::TaskStarted { .. } => "TASK_STARTED",
            Event::TaskSubmitted { .. } => "TASK_SUBMITTED",
            Event::TaskAccepted { .. } => "TASK_ACCEPTED",
            Event::TaskRejected { .. } => "TASK_REJECTED",
            Event::TaskEscalated { .. } => "TASK_ESCALATED",
            Event::TaskRevoked { .. } => "TASK_REVOKED",
            Event::TaskVerified { .. } => "TASK_VERIFIED",
            Event::AgentStreamStarted { .. } => "AGENT_STREAM_STARTED",
            Event::AgentStreamChunk { .. } => "AGENT_STREAM_CHUNK",
            Event::AgentStreamEnded { .. } => "AGENT_STREAM_ENDED",
            Event::DelegationRequested { .. } => "DELEGATION_REQUESTED",
            Event::DelegationAccepted { .. } => "DELEGATION_ACCEPTED",
            Event::DelegationChain { .. } => "DELEGATION_CHAIN",
            Event::CouncilStarted { .. } => "COUNCIL_STARTED",
            Event::CouncilCompleted { .. } => "COUNCIL_COMPLETED",
            Event::WorkflowStarted { .. } => "WORKFLOW_STARTED",
            Event::WorkflowStepStarted { .. } => "WORKFLOW_STEP_STARTED",
            Event::WorkflowStepCompleted { .. } => "WORKFLOW_STEP_COMPLETED",
            Event::WorkflowStepFailed { .. } => "WORKFLOW_STEP_FAILED",
            Event::WorkflowCompleted { .. } => "WORKFLOW_COMPLETED",
            Event::WorkflowCancelled { .. } => "WORKFLOW_CANCELLED",
            Event::TddRunStarted { .. } => "TDD_RUN_STARTED",
            Event::TddTestOutput { .. } => "TDD_TEST_OUTPUT",
            Event::TddRunCompleted { .. } => "TDD_RUN_COMPLETED",
            Event::SlaWarning { .. } => "SLA_WARNING",
            Event::SlaBreach { .. } => "SLA_BREACH",
            Event::ResourceWarning { .. } => "RESOURCE_WARNING",
            Event::TrustUpdate { .. } => "TRUST_UPDATE",
            Event::CircuitBreakerOpen { .. } => "CIRCUIT_BREAKER_OPEN",
            Event::CircuitBreakerClosed { .. } => "CIRCUIT_BREAKER_CLOSED",
            Event::ProgressUpdate { .. } => "PROGRESS_UPDATE",
            Event::CheckpointReached { .. } => "CHECKPOINT_REACHED",
            Event::Reassignment { .. } => "REASSIGNMENT",
            Event::AccountHealth { .. } => "ACCOUNT_HEALTH",
        }
    }

    /// Task this event refers to, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Event::TaskCreated { task_id, .. }
            | Event::TaskStarted { task_id, .. }
            | Event::TaskSubmitted { task_id, .. }
            | Event::TaskAccepted { task_id, .. }
            | Event::TaskRejected { task_id, .. }
            | Event::TaskEscalated { task_id, .. }
            | Event::TaskRevoked { task_id, .. }
            | Event::DelegationRequested { task_id, .. }
            | Event::DelegationChain { task_id, .. }
            | Event::TddRunStarted { task_id, .. }
            | Event::TddTestOutput { task_id, .. }
            | Event::TddRunCompleted { task_id, .. }
            | Event::SlaWarning { task_id, .. }
            | Event::SlaBreach { task_id, .. }
            | Event::ResourceWarning { task_id, .. }
            | Event::ProgressUpdate { task_id, .. }
            | Event::CheckpointReached { task_id, .. }
            | Event::Reassignment { task_id, .. } => Some(task_id),
            Event::TaskVerified { receipt, .. } => Some(&receipt.task_id),
            Event::AgentStreamStarted { task_id, .. } => task_id.as_deref(),
            _ => None,
        }
    }
}

/// A stored event: taxonomy payload plus the envelope the bus assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Opaque unique id assigned at emit time.
    pub id: String,
    /// ISO-8601 UTC timestamp assigned at emit time.
    pub timestamp: String,
    #[serde(flatten)]
    pub event: Event,
}

/// Anything events can be emitted onto.
///
/// The daemon's event bus is the production implementation; engine components
/// hold `Arc<dyn EventSink>` so they can be tested with a recording fake.
pub trait EventSink: Send + Sync {
    /// Emit an event, returning its assigned envelope id.
    fn emit(&self, event: Event) -> String;
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
