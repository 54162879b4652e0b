// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hub-daemon: the coordination daemon (`hubd`).
//!
//! Architecture:
//! - Listener task: accepts socket connections, one task per connection
//! - Event bus: synchronous in-process pub/sub with a bounded recent ring
//! - Subscription registry: fans events out to subscribed connections
//! - Periodic tasks: SLA sweeps, event-log pruning, watchdog

pub mod auth;
pub mod env;
pub mod event_bus;
pub mod frame;
pub mod lifecycle;
pub mod listener;
pub mod protocol;
pub mod subscriptions;
pub mod watchdog;

pub use event_bus::{EventBus, HandlerHandle, RecentFilter};
pub use frame::{Decoded, FrameDecoder, FrameError, MAX_FRAME_BYTES};
pub use lifecycle::{
    startup, Config, DaemonHandle, ExternalDeps, Features, LifecycleError, StartupResult,
};
pub use protocol::{Request, Response};
pub use subscriptions::{
    SubscriptionRegistry, DRAIN_TIMEOUT, HEARTBEAT_INTERVAL, MAX_PENDING_WRITES,
    MAX_STREAM_CHUNK_BYTES,
};
