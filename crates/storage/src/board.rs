// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task board persistence.
//!
//! The board is one JSON document (`tasks.json`). Writers serialize through
//! the directory lock; the write itself is temp + atomic rename, so readers
//! never observe a torn file. A missing file reads as an empty board.

use crate::atomic::{load_json, save_json_atomic};
use crate::lock::{DirLock, LockError, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_LOCK_TTL};
use hub_core::{Task, TaskStatus, WorkloadSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Window for "recent" throughput, in milliseconds (60 minutes).
const THROUGHPUT_WINDOW_MS: u64 = 60 * 60 * 1000;

/// Board errors.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("task not found: {0}")]
    TaskNotFound(String),
}

/// The whole task board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskBoard {
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
}

impl TaskBoard {
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub fn insert(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    /// Per-agent workload snapshots derived from task state.
    ///
    /// `recent_throughput` counts tasks accepted within the last 60 minutes.
    pub fn workloads(&self, now_ms: u64) -> HashMap<String, WorkloadSnapshot> {
        let mut out: HashMap<String, WorkloadSnapshot> = HashMap::new();
        for task in self.tasks.values() {
            let Some(agent) = task.assignee.as_deref() else {
                continue;
            };
            let entry = out
                .entry(agent.to_string())
                .or_insert_with(|| WorkloadSnapshot {
                    account_name: agent.to_string(),
                    ..WorkloadSnapshot::default()
                });
            if task.status == TaskStatus::InProgress {
                entry.wip_count += 1;
            }
            if task.status.is_open() {
                entry.open_count += 1;
            }
            if task.status == TaskStatus::Accepted {
                if let Some(accepted_ms) = task.accepted_at_ms() {
                    if now_ms.saturating_sub(accepted_ms) <= THROUGHPUT_WINDOW_MS {
                        entry.recent_throughput += 1;
                    }
                }
            }
        }
        out
    }
}

/// File-backed board store.
#[derive(Debug, Clone)]
pub struct BoardStore {
    path: PathBuf,
    lock_ttl: Duration,
}

impl BoardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the board; a missing file is an empty board.
    pub fn load(&self) -> Result<TaskBoard, BoardError> {
        Ok(load_json(&self.path)?.unwrap_or_default())
    }

    /// Save the board atomically under the lock.
    pub fn save(&self, board: &TaskBoard) -> Result<(), BoardError> {
        let _lock = DirLock::acquire(&self.path, self.lock_ttl, DEFAULT_ACQUIRE_TIMEOUT)?;
        save_json_atomic(&self.path, board)?;
        Ok(())
    }

    /// Load, mutate, and save in one locked transaction.
    ///
    /// The closure's error aborts the transaction without writing.
    pub fn update<R, E>(
        &self,
        mutate: impl FnOnce(&mut TaskBoard) -> Result<R, E>,
    ) -> Result<R, UpdateError<E>> {
        let _lock = DirLock::acquire(&self.path, self.lock_ttl, DEFAULT_ACQUIRE_TIMEOUT)
            .map_err(|e| UpdateError::Store(e.into()))?;
        let mut board: TaskBoard = load_json(&self.path)
            .map_err(|e| UpdateError::Store(e.into()))?
            .unwrap_or_default();
        let result = mutate(&mut board).map_err(UpdateError::Op)?;
        save_json_atomic(&self.path, &board).map_err(|e| UpdateError::Store(e.into()))?;
        Ok(result)
    }
}

/// Error from a board transaction: the store failed, or the operation did.
#[derive(Debug, Error)]
pub enum UpdateError<E> {
    #[error(transparent)]
    Store(BoardError),

    #[error("operation failed")]
    Op(#[source] E),
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
