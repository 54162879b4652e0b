// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handoff payloads: the structured contract passed when responsibility for
//! a task moves between accounts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How badly things go wrong if the work is wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

/// Whether the work can be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reversibility {
    Reversible,
    Partial,
    Irreversible,
}

/// The structured payload carried inside a handoff message.
///
/// Only `goal` is required; everything else defaults so older payloads and
/// minimal workflow-step handoffs parse cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    #[serde(default)]
    pub goal: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifiability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversibility: Option<Reversibility>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autonomy_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_handoff_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_depth: Option<u32>,
}

/// Error parsing a handoff payload out of a record's `content`.
#[derive(Debug, Error)]
pub enum HandoffParseError {
    #[error("handoff content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("handoff payload has no goal")]
    MissingGoal,
}

/// A stored handoff: a message whose content is a [`HandoffPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    /// JSON-encoded [`HandoffPayload`].
    pub content: String,
    pub context: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl HandoffRecord {
    /// Parse the JSON payload out of `content`.
    pub fn payload(&self) -> Result<HandoffPayload, HandoffParseError> {
        let payload: HandoffPayload = serde_json::from_str(&self.content)?;
        if payload.goal.trim().is_empty() {
            return Err(HandoffParseError::MissingGoal);
        }
        Ok(payload)
    }
}

#[cfg(test)]
#[path = "handoff_tests.rs"]
mod tests;
