// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event bus.
//!
//! `emit` assigns an envelope (id + ISO timestamp), appends to the bounded
//! recent ring, then synchronously invokes handlers registered for the
//! event's type followed by wildcard handlers. Handlers run on a snapshot
//! taken under the lock, so a handler may (un)register handlers or emit
//! without deadlocking; handler panics are caught and logged.

use hub_core::{iso_utc, Clock, Envelope, Event, EventSink, IdGen};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

/// Default bound on the recent-events ring.
pub const DEFAULT_MAX_RECENT: usize = 1000;

/// Default result cap for [`EventBus::recent`].
const DEFAULT_RECENT_LIMIT: usize = 50;

/// Wildcard handler key.
const WILDCARD: &str = "*";

type Handler = Arc<dyn Fn(&Envelope) + Send + Sync>;

struct BusInner {
    recent: VecDeque<Envelope>,
    max_recent: usize,
    handlers: HashMap<String, Vec<(u64, Handler)>>,
    next_handler_id: u64,
}

/// Filter for [`EventBus::recent`].
#[derive(Debug, Clone, Default)]
pub struct RecentFilter {
    pub event_type: Option<String>,
    pub task_id: Option<String>,
    pub limit: Option<usize>,
}

/// The bus. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
    next_id: Arc<dyn Fn() -> String + Send + Sync>,
    now_ms: Arc<dyn Fn() -> u64 + Send + Sync>,
}

impl EventBus {
    /// Production bus: UUID ids, system clock.
    pub fn new(max_recent: usize) -> Self {
        Self::with_sources(max_recent, hub_core::UuidIdGen, hub_core::SystemClock)
    }

    /// Bus with injected id/time sources (tests).
    pub fn with_sources<I, C>(max_recent: usize, ids: I, clock: C) -> Self
    where
        I: IdGen + 'static,
        C: Clock + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                recent: VecDeque::with_capacity(max_recent.min(1024)),
                max_recent,
                handlers: HashMap::new(),
                next_handler_id: 1,
            })),
            next_id: Arc::new(move || ids.next()),
            now_ms: Arc::new(move || clock.epoch_ms()),
        }
    }

    /// Emit an event; returns the assigned envelope id.
    ///
    /// Handlers observe events in emit order. A panicking handler is logged
    /// and never blocks the others.
    pub fn emit(&self, event: Event) -> String {
        let envelope = Envelope {
            id: (self.next_id)(),
            timestamp: iso_utc((self.now_ms)()),
            event,
        };

        let handlers: Vec<Handler> = {
            let mut inner = self.inner.lock();
            if inner.recent.len() >= inner.max_recent {
                inner.recent.pop_front();
            }
            inner.recent.push_back(envelope.clone());

            let mut snapshot = Vec::new();
            if let Some(typed) = inner.handlers.get(envelope.event.type_name()) {
                snapshot.extend(typed.iter().map(|(_, h)| Arc::clone(h)));
            }
            if let Some(wild) = inner.handlers.get(WILDCARD) {
                snapshot.extend(wild.iter().map(|(_, h)| Arc::clone(h)));
            }
            snapshot
        };

        for handler in handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&envelope)
            }));
            if result.is_err() {
                warn!(
                    event_type = envelope.event.type_name(),
                    "event handler panicked; continuing"
                );
            }
        }

        envelope.id
    }

    /// Register a handler for one event type, or `"*"` for all.
    ///
    /// The returned handle unsubscribes; calling it twice is harmless.
    pub fn on<F>(&self, event_type: &str, handler: F) -> HandlerHandle
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_handler_id;
        inner.next_handler_id += 1;
        inner
            .handlers
            .entry(event_type.to_string())
            .or_default()
            .push((id, Arc::new(handler)));

        HandlerHandle {
            bus: Arc::downgrade(&self.inner),
            event_type: event_type.to_string(),
            id,
            done: AtomicBool::new(false),
        }
    }

    /// Most-recent matching events, oldest first, capped at `limit`
    /// (default 50).
    pub fn recent(&self, filter: &RecentFilter) -> Vec<Envelope> {
        let inner = self.inner.lock();
        let mut matches: Vec<Envelope> = inner
            .recent
            .iter()
            .filter(|env| {
                if let Some(t) = &filter.event_type {
                    if env.event.type_name() != t {
                        return false;
                    }
                }
                if let Some(task_id) = &filter.task_id {
                    if env.event.task_id() != Some(task_id.as_str()) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        let limit = filter.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        if matches.len() > limit {
            matches.drain(..matches.len() - limit);
        }
        matches
    }

    /// Wipe handlers and the ring (tests).
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.recent.clear();
        inner.handlers.clear();
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: Event) -> String {
        EventBus::emit(self, event)
    }
}

/// Unsubscribe handle returned by [`EventBus::on`]. Idempotent.
pub struct HandlerHandle {
    bus: Weak<Mutex<BusInner>>,
    event_type: String,
    id: u64,
    done: AtomicBool,
}

impl HandlerHandle {
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(inner) = self.bus.upgrade() {
            let mut inner = inner.lock();
            if let Some(list) = inner.handlers.get_mut(&self.event_type) {
                list.retain(|(id, _)| *id != self.id);
                if list.is_empty() {
                    inner.handlers.remove(&self.event_type);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
