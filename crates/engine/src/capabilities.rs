// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability store: declared skills merged with observed delivery stats.

use hub_core::{CapabilityRecord, Task, TaskStatus};
use hub_storage::{AccountsFile, TaskBoard};
use std::collections::BTreeMap;

/// In-memory capability records, one per account.
///
/// Declared fields (skills, provider type) come from `accounts.json`;
/// delivery statistics are folded in from the board and task outcomes.
#[derive(Debug, Default)]
pub struct CapabilityStore {
    records: BTreeMap<String, CapabilityRecord>,
}

impl CapabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records from declared account configuration.
    pub fn load_declared(&mut self, accounts: &AccountsFile) {
        for account in &accounts.accounts {
            let record = self.entry(&account.name);
            record.skills = account.skills.clone();
            record.provider_type = account.provider_type.clone();
        }
    }

    /// Make sure an account (seen via auth) has a record.
    pub fn ensure_account(&mut self, account: &str) {
        self.entry(account);
    }

    fn entry(&mut self, account: &str) -> &mut CapabilityRecord {
        self.records
            .entry(account.to_string())
            .or_insert_with(|| CapabilityRecord::new(account))
    }

    /// Record activity (any authenticated request) for recency scoring.
    pub fn touch(&mut self, account: &str, now_ms: u64) {
        self.entry(account).last_active_at = Some(now_ms);
    }

    /// Fold one delivered task into the stats.
    ///
    /// `accepted` distinguishes review outcomes; `delivery_ms` is the
    /// in-progress-to-review wall time when known.
    pub fn record_delivery(&mut self, account: &str, accepted: bool, delivery_ms: Option<u64>) {
        let record = self.entry(account);
        record.total_tasks += 1;
        if accepted {
            record.accepted_tasks += 1;
        } else {
            record.rejected_tasks += 1;
        }
        if let Some(ms) = delivery_ms {
            record.avg_delivery_ms = Some(match record.avg_delivery_ms {
                // Running mean over delivered tasks
                Some(avg) => {
                    let n = record.total_tasks as u64;
                    (avg * (n - 1) + ms) / n
                }
                None => ms,
            });
        }
    }

    /// Refresh trust scores from the trust store.
    pub fn set_trust(&mut self, account: &str, score: i32) {
        self.entry(account).trust_score = Some(score);
    }

    /// Rebuild delivery stats from a board (startup recovery).
    ///
    /// Counts terminal review outcomes per assignee; in-flight tasks only
    /// contribute recency.
    pub fn rebuild_from_board(&mut self, board: &TaskBoard) {
        for task in board.tasks.values() {
            let Some(assignee) = task.assignee.clone() else {
                continue;
            };
            match task.status {
                TaskStatus::Accepted => {
                    let delivery = delivery_ms(task);
                    self.record_delivery(&assignee, true, delivery);
                }
                TaskStatus::Rejected => {
                    self.record_delivery(&assignee, false, None);
                }
                _ => {}
            }
            if let Some(entered) = task.entered_status_ms() {
                let record = self.entry(&assignee);
                record.last_active_at = Some(record.last_active_at.unwrap_or(0).max(entered));
            }
        }
    }

    pub fn get(&self, account: &str) -> Option<&CapabilityRecord> {
        self.records.get(account)
    }

    /// All records in account order (deterministic ranking input).
    pub fn all(&self) -> Vec<CapabilityRecord> {
        self.records.values().cloned().collect()
    }
}

fn delivery_ms(task: &Task) -> Option<u64> {
    let started = task.entered_in_progress_ms()?;
    let accepted = task.accepted_at_ms()?;
    Some(accepted.saturating_sub(started))
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
