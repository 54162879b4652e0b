// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hub-engine: coordination policies.
//!
//! Pure-ish domain engines that the daemon wires to stores, adapters, and
//! the event bus: routing, trust, SLA, workflow scheduling, acceptance, and
//! the circuit breaker.

pub mod acceptance;
pub mod analytics;
pub mod breaker;
pub mod capabilities;
pub mod router;
pub mod sla;
pub mod trust;
pub mod workflow;

pub use acceptance::{AcceptanceConfig, AcceptanceOutcome, AcceptanceRunner};
pub use analytics::{compute_analytics, AgentStats, Analytics};
pub use breaker::{revoke_in_flight, BreakerConfig, CircuitBreaker, Quarantine};
pub use capabilities::CapabilityStore;
pub use router::{rank, score, workload_modifier, RankOptions, RouterConfig, ScoredAccount};
pub use sla::adaptive::{
    AdaptiveAction, AdaptiveConfig, AdaptiveEventKind, AdaptiveFinding, AdaptiveSla,
    AdaptiveTrigger, TaskCharacteristics,
};
pub use sla::{check_board, SlaAction, SlaConfig, SlaFinding, BLOCKED_TAG};
pub use trust::{TrustDelta, TrustStore};
pub use workflow::{AssigneeResolver, FnResolver, WorkflowEngine, WorkflowEngineError};

#[cfg(test)]
pub(crate) mod test_support;
