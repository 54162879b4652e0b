// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription registry: fans bus events out to subscribed connections.
//!
//! Each connection owns a bounded writer channel; `broadcast` never blocks.
//! A subscriber whose channel is full loses the event (logged); a
//! subscriber whose socket stops draining is destroyed by its writer task
//! after [`DRAIN_TIMEOUT`]. A heartbeat frame goes to every subscriber
//! while any subscription exists.

use hub_core::Envelope;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Maximum frames queued per subscriber before events are dropped.
pub const MAX_PENDING_WRITES: usize = 500;

/// How long a single write may stall before the socket is destroyed.
pub const DRAIN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Heartbeat cadence while subscriptions exist.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Events encoding larger than this are not streamed.
pub const MAX_STREAM_CHUNK_BYTES: usize = 256 * 1024;

/// `{"type":"stream_event","event":{...}}`
#[derive(Serialize)]
struct StreamFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    event: &'a Envelope,
}

/// Pattern match: exact type, `*`, or `PREFIX*`.
pub fn pattern_matches(pattern: &str, event_type: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => event_type.starts_with(prefix),
        None => pattern == event_type,
    }
}

struct Subscription {
    account: String,
    patterns: BTreeSet<String>,
    tx: mpsc::Sender<Arc<str>>,
}

#[derive(Default)]
struct Registry {
    subs: HashMap<u64, Subscription>,
    heartbeat: Option<tokio::task::JoinHandle<()>>,
}

/// The registry. Clones share state.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add patterns for a connection, creating its subscription if new.
    ///
    /// The first subscription starts the heartbeat task.
    pub fn subscribe(
        &self,
        conn_id: u64,
        account: &str,
        patterns: Vec<String>,
        tx: mpsc::Sender<Arc<str>>,
    ) {
        let mut inner = self.inner.lock();
        let sub = inner.subs.entry(conn_id).or_insert_with(|| Subscription {
            account: account.to_string(),
            patterns: BTreeSet::new(),
            tx,
        });
        sub.patterns.extend(patterns);
        debug!(conn_id, account, patterns = ?sub.patterns, "subscribed");

        if inner.heartbeat.is_none() {
            inner.heartbeat = spawn_heartbeat(Arc::clone(&self.inner));
        }
    }

    /// Remove listed patterns (or all), dropping empty subscriptions.
    ///
    /// The heartbeat stops when the registry empties.
    pub fn unsubscribe(&self, conn_id: u64, patterns: Option<Vec<String>>) {
        let mut inner = self.inner.lock();
        let remove = match (inner.subs.get_mut(&conn_id), patterns) {
            (Some(sub), Some(patterns)) => {
                for pattern in &patterns {
                    sub.patterns.remove(pattern);
                }
                sub.patterns.is_empty()
            }
            (Some(_), None) => true,
            (None, _) => false,
        };
        if remove {
            inner.subs.remove(&conn_id);
        }
        stop_heartbeat_if_idle(&mut inner);
    }

    /// Forget a connection entirely (socket closed).
    pub fn remove_conn(&self, conn_id: u64) {
        let mut inner = self.inner.lock();
        inner.subs.remove(&conn_id);
        stop_heartbeat_if_idle(&mut inner);
    }

    /// Fan one envelope out to matching subscribers.
    pub fn broadcast(&self, envelope: &Envelope) {
        let frame = match crate::frame::encode(&StreamFrame {
            kind: "stream_event",
            event: envelope,
        }) {
            Ok(bytes) if bytes.len() > MAX_STREAM_CHUNK_BYTES => return, // too large to stream
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to encode stream frame");
                return;
            }
        };
        let frame: Arc<str> = match std::str::from_utf8(&frame) {
            Ok(s) => Arc::from(s),
            Err(_) => return,
        };

        let event_type = envelope.event.type_name();
        let mut dead = Vec::new();
        {
            let inner = self.inner.lock();
            for (&conn_id, sub) in &inner.subs {
                if !sub.patterns.iter().any(|p| pattern_matches(p, event_type)) {
                    continue;
                }
                match sub.tx.try_send(Arc::clone(&frame)) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            conn_id,
                            account = %sub.account,
                            event_type,
                            "subscriber backpressured; dropping event"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => dead.push(conn_id),
                }
            }
        }
        for conn_id in dead {
            self.remove_conn(conn_id);
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.inner.lock().subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Patterns held by one connection (introspection / tests).
    pub fn patterns(&self, conn_id: u64) -> Option<Vec<String>> {
        self.inner
            .lock()
            .subs
            .get(&conn_id)
            .map(|s| s.patterns.iter().cloned().collect())
    }

    /// Drop all subscriptions and stop the heartbeat. Idempotent.
    pub fn destroy(&self) {
        let mut inner = self.inner.lock();
        inner.subs.clear();
        if let Some(handle) = inner.heartbeat.take() {
            handle.abort();
        }
    }
}

fn stop_heartbeat_if_idle(inner: &mut Registry) {
    if inner.subs.is_empty() {
        if let Some(handle) = inner.heartbeat.take() {
            handle.abort();
        }
    }
}

/// Periodic heartbeat to all subscribers; dead channels are reaped.
///
/// Returns `None` outside a tokio runtime (sync unit tests).
fn spawn_heartbeat(inner: Arc<Mutex<Registry>>) -> Option<tokio::task::JoinHandle<()>> {
    let handle = tokio::runtime::Handle::try_current().ok()?;
    Some(handle.spawn(async move {
        let frame: Arc<str> = Arc::from("{\"type\":\"heartbeat\"}\n");
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so subscribers don't get
        // a heartbeat right after subscribing.
        interval.tick().await;
        loop {
            interval.tick().await;
            let mut dead = Vec::new();
            {
                let registry = inner.lock();
                for (&conn_id, sub) in &registry.subs {
                    if sub.tx.try_send(Arc::clone(&frame)).is_err() {
                        if sub.tx.is_closed() {
                            dead.push(conn_id);
                        }
                    }
                }
            }
            if !dead.is_empty() {
                let mut registry = inner.lock();
                for conn_id in dead {
                    registry.subs.remove(&conn_id);
                }
            }
        }
    }))
}

/// Per-connection writer: drains the channel onto the socket.
///
/// A write that stalls past [`DRAIN_TIMEOUT`] destroys the socket and
/// forgets the subscription, implementing the drain-timer contract.
pub(crate) fn spawn_writer<W>(
    conn_id: u64,
    registry: SubscriptionRegistry,
    mut writer: W,
    mut rx: mpsc::Receiver<Arc<str>>,
) -> tokio::task::JoinHandle<()>
where
    W: AsyncWriteExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let write = writer.write_all(frame.as_bytes());
            match tokio::time::timeout(DRAIN_TIMEOUT, write).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(conn_id, error = %e, "subscriber socket write failed");
                    registry.remove_conn(conn_id);
                    break;
                }
                Err(_) => {
                    warn!(conn_id, "subscriber failed to drain; destroying socket");
                    registry.remove_conn(conn_id);
                    break;
                }
            }
        }
        let _ = writer.shutdown().await;
    })
}

#[cfg(test)]
#[path = "subscriptions_tests.rs"]
mod tests;
