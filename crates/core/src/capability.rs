// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability and workload records consumed by the router.

use serde::{Deserialize, Serialize};

/// What one account is good at, and how it has performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRecord {
    pub account_name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub accepted_tasks: u32,
    #[serde(default)]
    pub rejected_tasks: u32,
    /// Mean wall-clock delivery time, in milliseconds. `None` when no task
    /// has been delivered yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_delivery_ms: Option<u64>,
    /// Epoch ms of the last observed activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<i32>,
}

impl CapabilityRecord {
    pub fn new(account_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            skills: Vec::new(),
            total_tasks: 0,
            accepted_tasks: 0,
            rejected_tasks: 0,
            avg_delivery_ms: None,
            last_active_at: None,
            provider_type: None,
            trust_score: None,
        }
    }
}

/// Current load on one account, derived from the task board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSnapshot {
    pub account_name: String,
    /// Tasks currently `in_progress`.
    pub wip_count: u32,
    /// Non-terminal tasks assigned to the account.
    pub open_count: u32,
    /// Tasks accepted within the last 60 minutes.
    pub recent_throughput: u32,
}
