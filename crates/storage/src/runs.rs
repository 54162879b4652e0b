// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow run and step-run persistence.

use crate::atomic::{load_json, save_json_atomic};
use crate::board::{BoardError, UpdateError};
use crate::lock::{DirLock, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_LOCK_TTL};
use hub_workflow::{StepRun, WorkflowRun};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// All runs and their step runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRuns {
    #[serde(default)]
    pub runs: BTreeMap<String, WorkflowRun>,
    #[serde(default)]
    pub step_runs: BTreeMap<String, StepRun>,
}

impl WorkflowRuns {
    /// Step runs belonging to one run, in step-run id order.
    pub fn steps_for(&self, run_id: &str) -> Vec<&StepRun> {
        self.step_runs
            .values()
            .filter(|sr| sr.run_id == run_id)
            .collect()
    }

    /// Mutable lookup of one run's step run by step id.
    pub fn step_mut(&mut self, run_id: &str, step_id: &str) -> Option<&mut StepRun> {
        self.step_runs
            .values_mut()
            .find(|sr| sr.run_id == run_id && sr.step_id == step_id)
    }
}

/// File-backed run store (`workflow-runs.json`).
#[derive(Debug, Clone)]
pub struct RunStore {
    path: PathBuf,
}

impl RunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load all runs; missing file is empty.
    pub fn load(&self) -> Result<WorkflowRuns, BoardError> {
        Ok(load_json(&self.path)?.unwrap_or_default())
    }

    /// Load, mutate, and save under the lock.
    pub fn update<R, E>(
        &self,
        mutate: impl FnOnce(&mut WorkflowRuns) -> Result<R, E>,
    ) -> Result<R, UpdateError<E>> {
        let _lock = DirLock::acquire(&self.path, DEFAULT_LOCK_TTL, DEFAULT_ACQUIRE_TIMEOUT)
            .map_err(|e| UpdateError::Store(e.into()))?;
        let mut runs: WorkflowRuns = load_json(&self.path)
            .map_err(|e| UpdateError::Store(BoardError::Io(e)))?
            .unwrap_or_default();
        let result = mutate(&mut runs).map_err(UpdateError::Op)?;
        save_json_atomic(&self.path, &runs).map_err(|e| UpdateError::Store(BoardError::Io(e)))?;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
