// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace registry.
//!
//! Tracks the worktrees handed to agents. The actual VCS plumbing lives
//! behind the workspace provider adapter; the daemon only owns these rows.

use crate::atomic::{load_json, save_json_atomic};
use crate::board::BoardError;
use crate::lock::{DirLock, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_LOCK_TTL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Lifecycle of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Active,
    Released,
    Failed,
}

/// One registered workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRecord {
    pub id: String,
    pub task_id: String,
    pub path: PathBuf,
    pub branch: String,
    pub status: WorkspaceStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkspaceFile {
    #[serde(default)]
    workspaces: BTreeMap<String, WorkspaceRecord>,
}

/// File-backed registry (`workspaces.json`).
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    path: PathBuf,
}

impl WorkspaceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn register(&self, record: WorkspaceRecord) -> Result<(), BoardError> {
        let _lock = DirLock::acquire(&self.path, DEFAULT_LOCK_TTL, DEFAULT_ACQUIRE_TIMEOUT)?;
        let mut file: WorkspaceFile = load_json(&self.path)?.unwrap_or_default();
        file.workspaces.insert(record.id.clone(), record);
        save_json_atomic(&self.path, &file)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<WorkspaceRecord>, BoardError> {
        let file: WorkspaceFile = load_json(&self.path)?.unwrap_or_default();
        Ok(file.workspaces.get(id).cloned())
    }

    /// Workspaces registered for one task, newest first by created_at.
    pub fn for_task(&self, task_id: &str) -> Result<Vec<WorkspaceRecord>, BoardError> {
        let file: WorkspaceFile = load_json(&self.path)?.unwrap_or_default();
        let mut records: Vec<WorkspaceRecord> = file
            .workspaces
            .values()
            .filter(|w| w.task_id == task_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub fn set_status(&self, id: &str, status: WorkspaceStatus) -> Result<(), BoardError> {
        let _lock = DirLock::acquire(&self.path, DEFAULT_LOCK_TTL, DEFAULT_ACQUIRE_TIMEOUT)?;
        let mut file: WorkspaceFile = load_json(&self.path)?.unwrap_or_default();
        let record = file
            .workspaces
            .get_mut(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))?;
        record.status = status;
        save_json_atomic(&self.path, &file)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "workspaces_tests.rs"]
mod tests;
