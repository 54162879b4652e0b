// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for engine tests.

use hub_core::{Event, EventSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Sink that records every emitted event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
    counter: Mutex<u64>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.type_name()).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) -> String {
        self.events.lock().push(event);
        let mut counter = self.counter.lock();
        *counter += 1;
        format!("ev-{}", *counter)
    }
}
