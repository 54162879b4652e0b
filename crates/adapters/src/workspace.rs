// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace provisioning seam.
//!
//! Real VCS integration (worktrees, branch pushes) lives outside the
//! daemon. The default provider just materializes a directory per handoff
//! so acceptance commands have somewhere to run.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-support"))]
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Workspace provisioning errors.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workspace provider failure: {0}")]
    Provider(String),
}

/// Prepares and tears down per-task workspaces.
#[async_trait]
pub trait WorkspaceProvider: Send + Sync {
    /// Materialize a workspace for a task/branch pair, returning its path.
    async fn prepare(&self, task_id: &str, branch: &str) -> Result<PathBuf, WorkspaceError>;

    /// Release a previously prepared workspace.
    async fn cleanup(&self, path: &Path) -> Result<(), WorkspaceError>;
}

/// Provider that creates plain directories under a root.
#[derive(Debug, Clone)]
pub struct LocalWorkspaceProvider {
    root: PathBuf,
}

impl LocalWorkspaceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl WorkspaceProvider for LocalWorkspaceProvider {
    async fn prepare(&self, task_id: &str, branch: &str) -> Result<PathBuf, WorkspaceError> {
        // Branch names may contain '/'; flatten for the directory name
        let dir_name = format!("{}-{}", task_id, branch.replace('/', "-"));
        let path = self.root.join(dir_name);
        tokio::fs::create_dir_all(&path).await?;
        Ok(path)
    }

    async fn cleanup(&self, path: &Path) -> Result<(), WorkspaceError> {
        // Refuse to delete outside our root
        if !path.starts_with(&self.root) {
            return Err(WorkspaceError::Provider(format!(
                "refusing to remove {} outside workspace root",
                path.display()
            )));
        }
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Recording provider for tests; prepares paths without touching disk.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct FakeWorkspaceProvider {
    pub prepared: Mutex<Vec<(String, String)>>,
    pub cleaned: Mutex<Vec<PathBuf>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeWorkspaceProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl WorkspaceProvider for FakeWorkspaceProvider {
    async fn prepare(&self, task_id: &str, branch: &str) -> Result<PathBuf, WorkspaceError> {
        self.prepared
            .lock()
            .push((task_id.to_string(), branch.to_string()));
        Ok(PathBuf::from(format!("/fake/{task_id}")))
    }

    async fn cleanup(&self, path: &Path) -> Result<(), WorkspaceError> {
        self.cleaned.lock().push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
