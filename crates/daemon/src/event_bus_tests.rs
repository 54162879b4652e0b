// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_core::{FakeClock, SequentialIdGen};
use parking_lot::Mutex as PlMutex;
use std::sync::Arc;

fn bus() -> EventBus {
    EventBus::with_sources(DEFAULT_MAX_RECENT, SequentialIdGen::new("ev"), FakeClock::new())
}

fn started(task: &str) -> Event {
    Event::TaskStarted {
        task_id: task.to_string(),
        agent: "alice".to_string(),
    }
}

fn accepted(task: &str) -> Event {
    Event::TaskAccepted {
        task_id: task.to_string(),
        agent: None,
    }
}

#[test]
fn emit_assigns_ids_and_timestamps() {
    let bus = bus();
    let id1 = bus.emit(started("t1"));
    let id2 = bus.emit(started("t2"));
    assert_eq!(id1, "ev-1");
    assert_eq!(id2, "ev-2");

    let recent = bus.recent(&RecentFilter::default());
    assert_eq!(recent.len(), 2);
    assert!(!recent[0].timestamp.is_empty());
}

#[test]
fn typed_handlers_see_only_their_type() {
    let bus = bus();
    let seen = Arc::new(PlMutex::new(Vec::new()));

    let handle = {
        let seen = Arc::clone(&seen);
        bus.on("TASK_STARTED", move |env| {
            seen.lock().push(env.event.type_name());
        })
    };

    bus.emit(started("t1"));
    bus.emit(accepted("t1"));
    bus.emit(started("t2"));

    assert_eq!(*seen.lock(), vec!["TASK_STARTED", "TASK_STARTED"]);
    handle.unsubscribe();
}

#[test]
fn wildcard_handlers_see_everything_in_emit_order() {
    let bus = bus();
    let seen = Arc::new(PlMutex::new(Vec::new()));

    let _handle = {
        let seen = Arc::clone(&seen);
        bus.on("*", move |env| {
            seen.lock().push(env.id.clone());
        })
    };

    bus.emit(started("t1"));
    bus.emit(accepted("t1"));

    assert_eq!(*seen.lock(), vec!["ev-1", "ev-2"]);
}

#[test]
fn typed_handlers_run_before_wildcard() {
    let bus = bus();
    let order = Arc::new(PlMutex::new(Vec::new()));

    let _wild = {
        let order = Arc::clone(&order);
        bus.on("*", move |_| order.lock().push("wild"))
    };
    let _typed = {
        let order = Arc::clone(&order);
        bus.on("TASK_STARTED", move |_| order.lock().push("typed"))
    };

    bus.emit(started("t1"));
    assert_eq!(*order.lock(), vec!["typed", "wild"]);
}

#[test]
fn unsubscribe_is_idempotent() {
    let bus = bus();
    let count = Arc::new(PlMutex::new(0u32));

    let handle = {
        let count = Arc::clone(&count);
        bus.on("TASK_STARTED", move |_| *count.lock() += 1)
    };

    bus.emit(started("t1"));
    handle.unsubscribe();
    handle.unsubscribe();
    bus.emit(started("t2"));

    assert_eq!(*count.lock(), 1);
}

#[test]
fn panicking_handler_does_not_block_others() {
    let bus = bus();
    let survived = Arc::new(PlMutex::new(false));

    let _bad = bus.on("*", |_| panic!("handler blew up"));
    let _good = {
        let survived = Arc::clone(&survived);
        bus.on("*", move |_| *survived.lock() = true)
    };

    let id = bus.emit(started("t1"));
    assert!(!id.is_empty(), "emit must not propagate the panic");
    assert!(*survived.lock());
}

#[test]
fn handlers_may_emit_reentrantly() {
    let bus = bus();
    let inner_bus = bus.clone();
    let fired = Arc::new(PlMutex::new(0u32));

    let _chain = {
        let fired = Arc::clone(&fired);
        bus.on("TASK_STARTED", move |_| {
            *fired.lock() += 1;
            if *fired.lock() == 1 {
                inner_bus.emit(accepted("t1"));
            }
        })
    };

    bus.emit(started("t1"));
    assert_eq!(bus.recent(&RecentFilter::default()).len(), 2);
}

#[test]
fn ring_evicts_oldest() {
    let bus = EventBus::with_sources(3, SequentialIdGen::new("ev"), FakeClock::new());
    for n in 0..5 {
        bus.emit(started(&format!("t{n}")));
    }
    let recent = bus.recent(&RecentFilter {
        limit: Some(100),
        ..RecentFilter::default()
    });
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].id, "ev-3", "oldest two evicted");
}

#[test]
fn recent_filters_by_type_and_task() {
    let bus = bus();
    bus.emit(started("t1"));
    bus.emit(accepted("t1"));
    bus.emit(started("t2"));

    let only_started = bus.recent(&RecentFilter {
        event_type: Some("TASK_STARTED".to_string()),
        ..RecentFilter::default()
    });
    assert_eq!(only_started.len(), 2);

    let only_t1 = bus.recent(&RecentFilter {
        task_id: Some("t1".to_string()),
        ..RecentFilter::default()
    });
    assert_eq!(only_t1.len(), 2);

    let both = bus.recent(&RecentFilter {
        event_type: Some("TASK_STARTED".to_string()),
        task_id: Some("t1".to_string()),
        ..RecentFilter::default()
    });
    assert_eq!(both.len(), 1);
}

#[test]
fn recent_limit_takes_newest() {
    let bus = bus();
    for n in 0..10 {
        bus.emit(started(&format!("t{n}")));
    }
    let capped = bus.recent(&RecentFilter {
        limit: Some(2),
        ..RecentFilter::default()
    });
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[1].id, "ev-10");
}

#[test]
fn clear_wipes_everything() {
    let bus = bus();
    let _h = bus.on("*", |_| {});
    bus.emit(started("t1"));

    bus.clear();
    assert!(bus.recent(&RecentFilter::default()).is_empty());
}

#[test]
fn timestamps_are_monotonic_for_one_emitter() {
    let clock = FakeClock::new();
    let bus = EventBus::with_sources(100, SequentialIdGen::new("ev"), clock.clone());
    bus.emit(started("t1"));
    clock.advance(std::time::Duration::from_millis(5));
    bus.emit(started("t2"));

    let recent = bus.recent(&RecentFilter::default());
    assert!(recent[0].timestamp <= recent[1].timestamp);
}
