// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener: accepts socket connections and dispatches requests.
//!
//! One task per connection. Replies and stream events share the
//! connection's writer channel, so they interleave in a single ordered
//! byte stream. The first frame must authenticate; everything after is
//! typed dispatch.

mod analytics;
mod handoff;
mod health;
mod knowledge;
mod messaging;
pub(crate) mod routing;
mod streaming;
mod tasks;
mod workflows;
mod workspace;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use hub_adapters::{SessionMetricsSource, WorkspaceProvider};
use hub_core::{AccountSession, Clock, ErrorKind, SystemClock, UuidIdGen};
use hub_engine::{
    AcceptanceRunner, AdaptiveSla, CapabilityStore, CircuitBreaker, RouterConfig, SlaConfig,
    TrustStore, WorkflowEngine,
};
use hub_storage::{
    BoardStore, EventLog, KnowledgeStore, MessageStore, TokenStore, WorkspaceStore,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::auth;
use crate::event_bus::EventBus;
use crate::frame::{self, FrameDecoder};
use crate::lifecycle::{Config, Features};
use crate::protocol::{Request, Response};
use crate::subscriptions::{self, SubscriptionRegistry, MAX_PENDING_WRITES};

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub config: Config,
    pub features: Features,
    pub bus: EventBus,
    pub subs: SubscriptionRegistry,
    pub board: BoardStore,
    pub messages: MessageStore,
    pub knowledge: KnowledgeStore,
    pub workspaces: WorkspaceStore,
    pub tokens: TokenStore,
    pub event_log: EventLog,
    pub trust: Arc<Mutex<TrustStore>>,
    pub breaker: Arc<Mutex<CircuitBreaker>>,
    pub adaptive: Arc<Mutex<AdaptiveSla>>,
    pub capabilities: Arc<Mutex<CapabilityStore>>,
    pub router_config: RouterConfig,
    pub sla_config: SlaConfig,
    pub metrics: Arc<dyn SessionMetricsSource>,
    pub workspace_provider: Arc<dyn WorkspaceProvider>,
    pub acceptance: Arc<AcceptanceRunner<SystemClock>>,
    pub workflows: Arc<WorkflowEngine<UuidIdGen, SystemClock>>,
    pub clock: SystemClock,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
    /// Root cancellation: child operations (acceptance suites) subscribe.
    pub cancel_root: CancellationToken,
    /// Live sessions, one per authenticated connection.
    pub sessions: Arc<Mutex<HashMap<u64, AccountSession>>>,
}

impl ListenCtx {
    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }
}

/// Per-connection state threaded through dispatch (post-handshake only).
pub(crate) struct ConnState {
    pub conn_id: u64,
    pub account: String,
    /// The connection's writer channel (replies and stream events).
    pub tx: mpsc::Sender<Arc<str>>,
}

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
    next_conn_id: AtomicU64,
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self {
            socket,
            ctx,
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Accept loop; runs until the daemon shuts down.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let conn_id = self.next_conn_id.fetch_add(1, Ordering::SeqCst);
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        handle_connection(stream, conn_id, ctx).await;
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Drive one client connection to completion.
async fn handle_connection(stream: UnixStream, conn_id: u64, ctx: Arc<ListenCtx>) {
    let (mut reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::channel::<Arc<str>>(MAX_PENDING_WRITES);
    let writer_task = subscriptions::spawn_writer(conn_id, ctx.subs.clone(), writer, rx);

    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; 8 * 1024];
    let mut account: Option<String> = None;
    let mut close = false;

    'conn: loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(conn_id, error = %e, "connection read failed");
                break;
            }
        };

        let decoded = decoder.push(&buf[..n]);

        for value in decoded.frames {
            let request_id = value
                .get("requestId")
                .and_then(Value::as_str)
                .map(str::to_string);

            let response = match &account {
                None => {
                    let (response, authed) = handshake(&value, conn_id, &ctx);
                    if let Some(name) = authed {
                        account = Some(name);
                    } else {
                        close = true;
                    }
                    response
                }
                Some(name) => {
                    let conn = ConnState {
                        conn_id,
                        account: name.clone(),
                        tx: tx.clone(),
                    };
                    match parse_request(value) {
                        Ok(request) => {
                            if matches!(request, Request::Auth { .. }) {
                                Response::error_kind(
                                    ErrorKind::Validation,
                                    "already authenticated",
                                )
                            } else {
                                dispatch(request, &conn, &ctx).await
                            }
                        }
                        Err(response) => response,
                    }
                }
            };

            if send_reply(&tx, response, request_id).await.is_err() {
                break 'conn;
            }
            if close {
                break 'conn;
            }
        }

        // Replies to the complete frames above went out first; an oversize
        // line still costs the connection.
        if let Some(size) = decoded.overflow {
            warn!(
                conn_id,
                size,
                max = frame::MAX_FRAME_BYTES,
                "oversize frame; closing connection"
            );
            break;
        }
    }

    // Connection teardown: forget the session and its subscriptions
    ctx.sessions.lock().remove(&conn_id);
    ctx.subs.remove_conn(conn_id);
    drop(tx);
    let _ = writer_task.await;
    if let Some(name) = account {
        debug!(conn_id, account = %name, "client disconnected");
    }
}

/// Handle the first frame: it must be `auth`.
///
/// Success registers exactly one [`AccountSession`] for this connection.
fn handshake(value: &Value, conn_id: u64, ctx: &ListenCtx) -> (Response, Option<String>) {
    let parsed: Result<Request, _> = serde_json::from_value(value.clone());
    let Ok(Request::Auth { account, token }) = parsed else {
        return (
            Response::AuthFail {
                error: "Expected auth".to_string(),
            },
            None,
        );
    };

    match auth::authenticate(&ctx.tokens, &account, &token) {
        Ok(()) => {
            info!(conn_id, account = %account, "authenticated");
            let now_ms = ctx.now_ms();
            if ctx.features.sessions {
                ctx.sessions
                    .lock()
                    .insert(conn_id, AccountSession::new(account.clone(), conn_id, now_ms));
            }
            let mut capabilities = ctx.capabilities.lock();
            capabilities.ensure_account(&account);
            capabilities.touch(&account, now_ms);
            (Response::AuthOk, Some(account))
        }
        Err(e) => {
            warn!(conn_id, account = %account, error = %e, "auth failed");
            (
                Response::AuthFail {
                    error: e.to_string(),
                },
                None,
            )
        }
    }
}

/// Typed parse with a validation reply on failure.
///
/// Unrecognized tags report `unknown type`; recognized tags with bad or
/// missing fields report the schema error.
fn parse_request(value: Value) -> Result<Request, Response> {
    let request_type = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);
    match serde_json::from_value::<Request>(value) {
        Ok(request) => Ok(request),
        Err(e) => match request_type {
            Some(t) => {
                let message = e.to_string();
                let error = if message.starts_with("unknown variant") {
                    "unknown type".to_string()
                } else {
                    message.clone()
                };
                Err(Response::Error {
                    error,
                    details: Some(serde_json::json!({
                        "kind": ErrorKind::Validation.as_str(),
                        "requestType": t,
                        "message": message,
                    })),
                })
            }
            None => Err(Response::error_kind(
                ErrorKind::Validation,
                "frame has no type",
            )),
        },
    }
}

/// Serialize a reply, echo the requestId, and queue it on the writer.
async fn send_reply(
    tx: &mpsc::Sender<Arc<str>>,
    response: Response,
    request_id: Option<String>,
) -> Result<(), ()> {
    let mut value = match serde_json::to_value(&response) {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "unserializable response");
            return Ok(());
        }
    };
    if let (Some(id), Some(obj)) = (request_id, value.as_object_mut()) {
        obj.insert("requestId".to_string(), Value::String(id));
    }
    let bytes = match frame::encode(&value) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "reply exceeded frame budget");
            return Ok(());
        }
    };
    let frame: Arc<str> = match std::str::from_utf8(&bytes) {
        Ok(s) => Arc::from(s),
        Err(_) => return Ok(()),
    };
    tx.send(frame).await.map_err(|_| ())
}

/// Typed dispatch to the handler modules.
async fn dispatch(request: Request, conn: &ConnState, ctx: &ListenCtx) -> Response {
    match request {
        Request::Auth { .. } => unreachable_auth(),

        Request::Ping => health::handle_ping(),
        Request::HealthCheck => health::handle_health_check(ctx),
        Request::GetAnalytics => analytics::handle_get_analytics(ctx),
        Request::ListAccounts => health::handle_list_accounts(ctx),

        Request::Shutdown => {
            info!(account = %conn.account, "shutdown requested");
            // Give the reply a moment to flush before tearing tasks down
            let shutdown = Arc::clone(&ctx.shutdown);
            let cancel = ctx.cancel_root.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                cancel.cancel();
                shutdown.notify_one();
            });
            Response::result(serde_json::json!({ "shuttingDown": true }))
        }

        Request::CreateTask {
            title,
            task_id,
            description,
            tags,
            priority,
        } => tasks::handle_create(ctx, conn, title, task_id, description, tags, priority),
        Request::ListTasks { status } => tasks::handle_list(ctx, status),
        Request::GetTask { task_id } => tasks::handle_get(ctx, &task_id),
        Request::UpdateTaskStatus {
            task_id,
            status,
            reason,
            workspace_context,
        } => tasks::handle_update_status(ctx, conn, &task_id, &status, reason, workspace_context),
        Request::ReportProgress {
            task_id,
            message,
            percent,
            checkpoint,
        } => tasks::handle_report_progress(ctx, conn, &task_id, &message, percent, checkpoint),
        Request::AdaptiveSlaCheck { task_id } => tasks::handle_adaptive_check(ctx, task_id),
        Request::GetTrust { agent } => tasks::handle_get_trust(ctx, agent),
        Request::ReinstateAgent { agent } => tasks::handle_reinstate(ctx, &agent),
        Request::CheckCircuitBreaker { agent } => tasks::handle_check_breaker(ctx, &agent),

        Request::SendMessage {
            to,
            body,
            context,
            task_id,
        } => messaging::handle_send(ctx, conn, to, body, context, task_id),
        Request::CountUnread => messaging::handle_count_unread(ctx, conn),
        Request::ReadMessages { limit } => messaging::handle_read(ctx, conn, limit),

        Request::HandoffTask {
            task_id,
            to,
            payload,
        } => handoff::handle_handoff(ctx, conn, &task_id, &to, payload),
        Request::HandoffAccept { handoff_id } => {
            handoff::handle_accept(ctx, conn, &handoff_id)
        }

        Request::PrepareWorktreeForHandoff { task_id, branch } => {
            workspace::handle_prepare(ctx, &task_id, &branch).await
        }
        Request::GetWorkspaceStatus {
            workspace_id,
            task_id,
        } => workspace::handle_status(ctx, workspace_id, task_id),
        Request::CleanupWorkspace { workspace_id } => {
            workspace::handle_cleanup(ctx, &workspace_id).await
        }

        Request::SuggestAssignee { skills, exclude } => {
            routing::handle_suggest(ctx, &skills, exclude)
        }

        Request::SearchKnowledge { query, limit } => {
            knowledge::handle_search(ctx, &query, limit)
        }
        Request::IndexNote { title, body, tags } => {
            knowledge::handle_index(ctx, conn, title, body, tags)
        }

        Request::Subscribe { patterns } => streaming::handle_subscribe(ctx, conn, patterns),
        Request::Unsubscribe { patterns } => {
            streaming::handle_unsubscribe(ctx, conn, patterns)
        }

        Request::TriggerWorkflow { workflow, context } => {
            workflows::handle_trigger(ctx, &workflow, context)
        }
        Request::CompleteWorkflowStep {
            run_id,
            step_id,
            result,
            error,
        } => workflows::handle_step_result(ctx, &run_id, &step_id, &result, error),
        Request::CancelWorkflow { run_id } => workflows::handle_cancel(ctx, &run_id),
        Request::GetWorkflowRun { run_id } => workflows::handle_get_run(ctx, &run_id),
    }
}

/// Auth frames are consumed by the handshake before dispatch.
fn unreachable_auth() -> Response {
    Response::error_kind(ErrorKind::Validation, "already authenticated")
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
