// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hub-adapters: seams to the outside world.
//!
//! Each adapter is a narrow trait with a production implementation and a
//! fake (behind the `test-support` feature) so the engine and daemon can be
//! tested hermetically.

pub mod friction;
pub mod metrics;
pub mod subprocess;
pub mod workspace;

pub use friction::{FrictionGate, FrictionVerdict, HeuristicFrictionGate, NoopFrictionGate};
pub use metrics::{NoopMetricsSource, SessionMetrics, SessionMetricsSource, SessionPhase};
pub use subprocess::{run_with_timeout, stream_command, CommandStatus, OutputLine, SubprocessError};
pub use workspace::{LocalWorkspaceProvider, WorkspaceError, WorkspaceProvider};

#[cfg(any(test, feature = "test-support"))]
pub use friction::FakeFrictionGate;
#[cfg(any(test, feature = "test-support"))]
pub use metrics::FakeMetricsSource;
#[cfg(any(test, feature = "test-support"))]
pub use workspace::FakeWorkspaceProvider;
