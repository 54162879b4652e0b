// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve the hub directory: `HUB_DIR` > `~/.hub`.
pub fn hub_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("HUB_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoHubDir)?;
    Ok(PathBuf::from(home).join(".hub"))
}

/// SLA sweep interval override (`HUB_SLA_CHECK_MS`).
pub fn sla_check_interval() -> Option<Duration> {
    std::env::var("HUB_SLA_CHECK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Event-log prune interval override (`HUB_PRUNE_INTERVAL_MS`).
pub fn prune_interval() -> Option<Duration> {
    std::env::var("HUB_PRUNE_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
