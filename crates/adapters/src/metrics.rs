// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session resource metrics feeding the adaptive SLA engine.

#[cfg(any(test, feature = "test-support"))]
use parking_lot::Mutex;
#[cfg(any(test, feature = "test-support"))]
use std::collections::HashMap;
#[cfg(any(test, feature = "test-support"))]
use std::sync::Arc;

/// Lifecycle phase of an agent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Ended,
}

/// Resource signals for one working session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetrics {
    pub account: String,
    /// Tokens per minute over the recent window.
    pub burn_rate: f64,
    /// Long-run average burn rate for this account.
    pub average_burn_rate: f64,
    /// Epoch ms of the session's last checkpoint, if any.
    pub last_checkpoint_ms: Option<u64>,
    /// Context window saturation in `[0, 1]`.
    pub context_saturation: f64,
    pub phase: SessionPhase,
    /// Epoch ms since when the session has been unresponsive, if it is.
    pub unresponsive_since_ms: Option<u64>,
}

/// Source of per-task session metrics.
///
/// The production implementation sits outside the daemon (it watches agent
/// session logs); the daemon only consumes this trait.
pub trait SessionMetricsSource: Send + Sync {
    /// Metrics for the session working on `task_id`, if one is known.
    fn metrics_for(&self, task_id: &str) -> Option<SessionMetrics>;
}

/// Source that knows nothing; adaptive checks become no-ops.
#[derive(Debug, Clone, Default)]
pub struct NoopMetricsSource;

impl SessionMetricsSource for NoopMetricsSource {
    fn metrics_for(&self, _task_id: &str) -> Option<SessionMetrics> {
        None
    }
}

/// Scriptable source for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct FakeMetricsSource {
    inner: Arc<Mutex<HashMap<String, SessionMetrics>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeMetricsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, task_id: impl Into<String>, metrics: SessionMetrics) {
        self.inner.lock().insert(task_id.into(), metrics);
    }

    pub fn clear(&self, task_id: &str) {
        self.inner.lock().remove(task_id);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl SessionMetricsSource for FakeMetricsSource {
    fn metrics_for(&self, task_id: &str) -> Option<SessionMetrics> {
        self.inner.lock().get(task_id).cloned()
    }
}
