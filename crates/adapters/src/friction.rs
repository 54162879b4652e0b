// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cognitive-friction gate: pre-acceptance heuristic that can demand a
//! human look before auto-acceptance runs.

use hub_core::{Criticality, HandoffPayload, Reversibility};
#[cfg(any(test, feature = "test-support"))]
use parking_lot::Mutex;
#[cfg(any(test, feature = "test-support"))]
use std::collections::VecDeque;

/// Gate verdict for one handoff payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrictionVerdict {
    Proceed,
    Block { reason: String, level: String },
}

impl FrictionVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, FrictionVerdict::Block { .. })
    }
}

/// Policy deciding whether auto-acceptance may run.
pub trait FrictionGate: Send + Sync {
    fn evaluate(&self, payload: &HandoffPayload) -> FrictionVerdict;
}

/// Gate that never blocks (friction feature disabled).
#[derive(Debug, Clone, Default)]
pub struct NoopFrictionGate;

impl FrictionGate for NoopFrictionGate {
    fn evaluate(&self, _payload: &HandoffPayload) -> FrictionVerdict {
        FrictionVerdict::Proceed
    }
}

/// Built-in conservative policy.
///
/// Blocks when the payload declares irreversible work at high or critical
/// criticality, and when a payload demanding verification evidence carries
/// no run commands to produce it.
#[derive(Debug, Clone, Default)]
pub struct HeuristicFrictionGate;

impl FrictionGate for HeuristicFrictionGate {
    fn evaluate(&self, payload: &HandoffPayload) -> FrictionVerdict {
        let critical = matches!(
            payload.criticality,
            Some(Criticality::High) | Some(Criticality::Critical)
        );
        if payload.reversibility == Some(Reversibility::Irreversible) && critical {
            return FrictionVerdict::Block {
                reason: "irreversible work at high criticality requires human review".to_string(),
                level: "high".to_string(),
            };
        }

        if payload.run_commands.is_empty()
            && payload.verification_policy.as_deref() == Some("require_evidence")
        {
            return FrictionVerdict::Block {
                reason: "verification policy requires evidence but no run commands are declared"
                    .to_string(),
                level: "medium".to_string(),
            };
        }

        FrictionVerdict::Proceed
    }
}

/// Scriptable gate for tests: pops queued verdicts, then proceeds.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct FakeFrictionGate {
    queued: Mutex<VecDeque<FrictionVerdict>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeFrictionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, verdict: FrictionVerdict) {
        self.queued.lock().push_back(verdict);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FrictionGate for FakeFrictionGate {
    fn evaluate(&self, _payload: &HandoffPayload) -> FrictionVerdict {
        self.queued
            .lock()
            .pop_front()
            .unwrap_or(FrictionVerdict::Proceed)
    }
}

#[cfg(test)]
#[path = "friction_tests.rs"]
mod tests;
