// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task lifecycle handlers.

use super::ListenCtx;
use crate::protocol::Response;
use hub_core::{
    Event, ErrorKind, Task, TaskOutcome, TaskPriority, TaskStatus, TransitionError,
    WorkspaceContext,
};
use hub_engine::{revoke_in_flight, AdaptiveAction, AdaptiveEventKind, TaskCharacteristics};
use hub_storage::UpdateError;
use serde_json::json;
use tracing::warn;

use super::ConnState;

/// Map a board-transaction error onto the wire.
fn transition_error(e: UpdateError<TaskOpError>) -> Response {
    match e {
        UpdateError::Store(inner) => Response::error(format!("board error: {inner}")),
        UpdateError::Op(TaskOpError::NotFound(id)) => {
            Response::error_kind(ErrorKind::NotFound, format!("task not found: {id}"))
        }
        UpdateError::Op(TaskOpError::Transition(inner)) => {
            Response::error_kind(ErrorKind::Validation, inner.to_string())
        }
        UpdateError::Op(TaskOpError::Invalid(message)) => {
            Response::error_kind(ErrorKind::Validation, message)
        }
    }
}

/// Errors raised inside board transactions.
#[derive(Debug, thiserror::Error)]
pub(super) enum TaskOpError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("{0}")]
    Invalid(String),
}

pub(super) fn handle_create(
    ctx: &ListenCtx,
    conn: &ConnState,
    title: String,
    task_id: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    priority: Option<TaskPriority>,
) -> Response {
    if title.trim().is_empty() {
        return Response::error_kind(ErrorKind::Validation, "title must not be empty");
    }
    let now_ms = ctx.now_ms();
    let id = task_id.unwrap_or_else(|| format!("task-{}", uuid_suffix()));

    let result = ctx.board.update(|board| {
        if board.get(&id).is_some() {
            return Err(TaskOpError::Invalid(format!("task already exists: {id}")));
        }
        let mut task = Task::new(id.clone(), title.clone(), now_ms);
        task.description = description.clone();
        task.tags = tags.clone();
        if let Some(priority) = priority {
            task.priority = priority;
        }
        board.insert(task.clone());
        Ok(task)
    });

    match result {
        Ok(task) => {
            ctx.bus.emit(Event::TaskCreated {
                task_id: task.id.clone(),
                title: task.title.clone(),
                agent: Some(conn.account.clone()),
            });
            task_reply(&task)
        }
        Err(e) => transition_error(e),
    }
}

pub(super) fn handle_list(ctx: &ListenCtx, status: Option<String>) -> Response {
    let board = match ctx.board.load() {
        Ok(board) => board,
        Err(e) => return Response::error(format!("board error: {e}")),
    };
    let tasks: Vec<&Task> = board
        .tasks
        .values()
        .filter(|t| match &status {
            Some(s) => t.status.to_string() == *s,
            None => true,
        })
        .collect();
    Response::result(json!({ "tasks": tasks }))
}

pub(super) fn handle_get(ctx: &ListenCtx, task_id: &str) -> Response {
    match ctx.board.load() {
        Ok(board) => match board.get(task_id) {
            Some(task) => task_reply(task),
            None => Response::error_kind(ErrorKind::NotFound, format!("task not found: {task_id}")),
        },
        Err(e) => Response::error(format!("board error: {e}")),
    }
}

/// `update_task_status`: the state-machine surface.
///
/// Target statuses map to transitions: `in_progress` → start,
/// `ready_for_review` → submit, `accepted` → accept, `rejected` → reject.
pub(super) fn handle_update_status(
    ctx: &ListenCtx,
    conn: &ConnState,
    task_id: &str,
    status: &str,
    reason: Option<String>,
    workspace_context: Option<WorkspaceContext>,
) -> Response {
    ctx.capabilities.lock().touch(&conn.account, ctx.now_ms());

    match status {
        "in_progress" => start_task(ctx, conn, task_id),
        "ready_for_review" => submit_task(ctx, conn, task_id, workspace_context),
        "accepted" => accept_task(ctx, task_id),
        "rejected" => match reason {
            Some(reason) if !reason.trim().is_empty() => reject_task(ctx, task_id, &reason),
            _ => Response::error_kind(ErrorKind::Validation, "reject requires a reason"),
        },
        other => Response::error_kind(
            ErrorKind::Validation,
            format!("cannot transition directly to status '{other}'"),
        ),
    }
}

fn start_task(ctx: &ListenCtx, conn: &ConnState, task_id: &str) -> Response {
    let now_ms = ctx.now_ms();
    if ctx.features.circuit_breaker && ctx.breaker.lock().is_quarantined(&conn.account, now_ms) {
        return Response::error_kind(
            ErrorKind::Validation,
            format!("agent is quarantined: {}", conn.account),
        );
    }

    let result = ctx.board.update(|board| {
        let task = board
            .get_mut(task_id)
            .ok_or_else(|| TaskOpError::NotFound(task_id.to_string()))?;
        task.start(&conn.account, now_ms)?;
        Ok(task.clone())
    });

    match result {
        Ok(task) => {
            ctx.bus.emit(Event::TaskStarted {
                task_id: task.id.clone(),
                agent: conn.account.clone(),
            });
            task_reply(&task)
        }
        Err(e) => transition_error(e),
    }
}

fn submit_task(
    ctx: &ListenCtx,
    conn: &ConnState,
    task_id: &str,
    workspace_context: Option<WorkspaceContext>,
) -> Response {
    let now_ms = ctx.now_ms();
    let result = ctx.board.update(|board| {
        let task = board
            .get_mut(task_id)
            .ok_or_else(|| TaskOpError::NotFound(task_id.to_string()))?;
        task.submit_for_review(workspace_context.clone(), now_ms)?;
        Ok(task.clone())
    });

    let task = match result {
        Ok(task) => task,
        Err(e) => return transition_error(e),
    };

    ctx.bus.emit(Event::TaskSubmitted {
        task_id: task.id.clone(),
        agent: conn.account.clone(),
        branch: task.workspace_context.as_ref().map(|w| w.branch.clone()),
    });

    // Auto-acceptance: reply immediately, verify asynchronously
    let acceptance = if ctx.features.auto_acceptance {
        let cancel = ctx.cancel_root.child_token();
        match std::sync::Arc::clone(&ctx.acceptance).begin(task_id, cancel) {
            hub_engine::AcceptanceOutcome::Running => json!("running"),
            hub_engine::AcceptanceOutcome::Blocked { reason, level } => {
                json!({ "blocked": { "reason": reason, "level": level } })
            }
            hub_engine::AcceptanceOutcome::NoSuite => json!("none"),
        }
    } else {
        json!("disabled")
    };

    Response::result(json!({ "task": task, "acceptance": acceptance }))
}

fn accept_task(ctx: &ListenCtx, task_id: &str) -> Response {
    let now_ms = ctx.now_ms();
    let result = ctx.board.update(|board| {
        let task = board
            .get_mut(task_id)
            .ok_or_else(|| TaskOpError::NotFound(task_id.to_string()))?;
        task.accept(now_ms)?;
        Ok(task.clone())
    });

    let task = match result {
        Ok(task) => task,
        Err(e) => return transition_error(e),
    };

    ctx.bus.emit(Event::TaskAccepted {
        task_id: task.id.clone(),
        agent: task.assignee.clone(),
    });

    if let Some(agent) = task.assignee.clone() {
        let delivery_ms = task
            .entered_in_progress_ms()
            .map(|started| now_ms.saturating_sub(started));
        credit_outcome(ctx, &agent, TaskOutcome::Completed, delivery_ms, "review accepted");
        ctx.capabilities
            .lock()
            .record_delivery(&agent, true, delivery_ms);
    }

    task_reply(&task)
}

fn reject_task(ctx: &ListenCtx, task_id: &str, reason: &str) -> Response {
    let now_ms = ctx.now_ms();
    let threshold = ctx.config.rejection_escalation_threshold;
    let result = ctx.board.update(|board| {
        let task = board
            .get_mut(task_id)
            .ok_or_else(|| TaskOpError::NotFound(task_id.to_string()))?;
        let outcome = task.reject(reason, threshold, now_ms)?;
        Ok((task.clone(), outcome))
    });

    let (task, outcome) = match result {
        Ok(pair) => pair,
        Err(e) => return transition_error(e),
    };

    ctx.bus.emit(Event::TaskRejected {
        task_id: task.id.clone(),
        agent: task.assignee.clone(),
        reason: reason.to_string(),
    });
    if outcome.escalated {
        ctx.bus.emit(Event::TaskEscalated {
            task_id: task.id.clone(),
            reason: format!("Rejected {} times", outcome.rejection_count),
        });
    }

    if let Some(agent) = task.assignee.clone() {
        credit_outcome(ctx, &agent, TaskOutcome::Rejected, None, "review rejected");
        ctx.capabilities.lock().record_delivery(&agent, false, None);
        record_agent_failure(ctx, &agent, now_ms);
    }

    task_reply(&task)
}

/// Trust bookkeeping shared by accept/reject; emits `TRUST_UPDATE` only on
/// actual movement.
fn credit_outcome(
    ctx: &ListenCtx,
    agent: &str,
    outcome: TaskOutcome,
    delivery_ms: Option<u64>,
    reason: &str,
) {
    if !ctx.features.trust {
        return;
    }
    let duration_minutes = delivery_ms.map(|ms| ms / 60_000);
    let delta = ctx
        .trust
        .lock()
        .record_outcome(agent, outcome, duration_minutes);
    ctx.capabilities.lock().set_trust(agent, delta.score);
    if delta.delta != 0 {
        ctx.bus.emit(Event::TrustUpdate {
            agent: agent.to_string(),
            delta: delta.delta,
            score: delta.score,
            reason: reason.to_string(),
        });
    }
}

/// Count a failure toward the circuit breaker; trip = quarantine + revoke.
pub(super) fn record_agent_failure(ctx: &ListenCtx, agent: &str, now_ms: u64) {
    if !ctx.features.circuit_breaker {
        return;
    }
    let tripped = ctx.breaker.lock().record_failure(agent, now_ms);
    let Some(quarantine) = tripped else {
        return;
    };

    let revoked = ctx.board.update(|board| {
        Ok::<_, TaskOpError>(revoke_in_flight(
            board,
            agent,
            "agent quarantined by circuit breaker",
            now_ms,
        ))
    });
    let revoked_task_ids = match revoked {
        Ok(ids) => ids,
        Err(e) => {
            warn!(agent, error = %transition_error_text(&e), "failed to revoke in-flight tasks");
            Vec::new()
        }
    };

    for task_id in &revoked_task_ids {
        ctx.bus.emit(Event::TaskRevoked {
            task_id: task_id.clone(),
            agent: agent.to_string(),
            reason: quarantine.reason.clone(),
        });
    }
    ctx.bus.emit(Event::CircuitBreakerOpen {
        agent: agent.to_string(),
        trigger: "repeated_failures".to_string(),
        reason: quarantine.reason.clone(),
        revoked_task_ids,
    });
}

fn transition_error_text(e: &UpdateError<TaskOpError>) -> String {
    match e {
        UpdateError::Store(inner) => inner.to_string(),
        UpdateError::Op(op) => op.to_string(),
    }
}

pub(super) fn handle_report_progress(
    ctx: &ListenCtx,
    conn: &ConnState,
    task_id: &str,
    message: &str,
    percent: Option<u8>,
    checkpoint: Option<String>,
) -> Response {
    let now_ms = ctx.now_ms();
    let result = ctx.board.update(|board| {
        let task = board
            .get_mut(task_id)
            .ok_or_else(|| TaskOpError::NotFound(task_id.to_string()))?;
        task.record_progress(message, now_ms);
        Ok(task.clone())
    });

    match result {
        Ok(task) => {
            ctx.bus.emit(Event::ProgressUpdate {
                task_id: task.id.clone(),
                agent: conn.account.clone(),
                message: message.to_string(),
                percent,
            });
            if let Some(label) = checkpoint {
                ctx.bus.emit(Event::CheckpointReached {
                    task_id: task.id.clone(),
                    agent: conn.account.clone(),
                    label,
                });
            }
            task_reply(&task)
        }
        Err(e) => transition_error(e),
    }
}

/// `adaptive_sla_check`: evaluate resource signals for one task or all
/// in-progress tasks.
pub(super) fn handle_adaptive_check(ctx: &ListenCtx, task_id: Option<String>) -> Response {
    if !ctx.features.sla_engine {
        return Response::error_kind(ErrorKind::Validation, "sla engine disabled");
    }
    let board = match ctx.board.load() {
        Ok(board) => board,
        Err(e) => return Response::error(format!("board error: {e}")),
    };
    let now_ms = ctx.now_ms();

    let candidates: Vec<&Task> = board
        .tasks
        .values()
        .filter(|t| t.status == TaskStatus::InProgress)
        .filter(|t| task_id.as_deref().map(|id| t.id == id).unwrap_or(true))
        .collect();

    let mut findings = Vec::new();
    for task in candidates {
        let Some(metrics) = ctx.metrics.metrics_for(&task.id) else {
            continue;
        };
        let characteristics = task_characteristics(ctx, &task.id);
        let finding = ctx
            .adaptive
            .lock()
            .evaluate(task, &metrics, &characteristics, now_ms);
        let Some(finding) = finding else {
            continue;
        };

        let (trigger, action) = (finding.trigger.as_str(), finding.action.as_str());
        match finding.event {
            AdaptiveEventKind::SlaBreach => {
                ctx.bus.emit(Event::SlaBreach {
                    task_id: task.id.clone(),
                    trigger: trigger.to_string(),
                    action: action.to_string(),
                });
            }
            AdaptiveEventKind::SlaWarning => {
                ctx.bus.emit(Event::SlaWarning {
                    task_id: task.id.clone(),
                    trigger: trigger.to_string(),
                    action: action.to_string(),
                });
            }
            AdaptiveEventKind::ResourceWarning => {
                ctx.bus.emit(Event::ResourceWarning {
                    task_id: task.id.clone(),
                    agent: task.assignee.clone(),
                    trigger: trigger.to_string(),
                    detail: action.to_string(),
                });
            }
        }

        if matches!(
            finding.action,
            AdaptiveAction::SuggestReassign | AdaptiveAction::AutoReassign
        ) {
            let exclude = task.assignee.clone().into_iter().collect();
            let suggestion = super::routing::ranked(ctx, &[], exclude)
                .into_iter()
                .next()
                .map(|s| s.account_name);
            ctx.bus.emit(Event::Reassignment {
                task_id: task.id.clone(),
                from: task.assignee.clone(),
                suggestion,
                reason: format!("adaptive sla: {trigger}"),
            });
        }

        findings.push(json!({
            "taskId": finding.task_id,
            "trigger": trigger,
            "action": action,
        }));
    }

    Response::result(json!({ "findings": findings }))
}

/// Risk characteristics from the task's most recent handoff payload.
fn task_characteristics(ctx: &ListenCtx, task_id: &str) -> TaskCharacteristics {
    let payload = ctx
        .messages
        .latest_handoff(task_id, None)
        .ok()
        .flatten()
        .and_then(|h| h.payload().ok());
    match payload {
        Some(payload) => TaskCharacteristics {
            criticality: payload.criticality,
            reversibility: payload.reversibility,
        },
        None => TaskCharacteristics::default(),
    }
}

pub(super) fn handle_get_trust(ctx: &ListenCtx, agent: Option<String>) -> Response {
    if !ctx.features.trust {
        return Response::error_kind(ErrorKind::Validation, "trust store disabled");
    }
    let trust = ctx.trust.lock();
    match agent {
        Some(agent) => match trust.get(&agent) {
            Some(record) => Response::result(json!({ "trust": record })),
            None => Response::error_kind(
                ErrorKind::NotFound,
                format!("no trust record for agent: {agent}"),
            ),
        },
        None => Response::result(json!({ "trust": trust.all() })),
    }
}

pub(super) fn handle_reinstate(ctx: &ListenCtx, agent: &str) -> Response {
    if !ctx.features.circuit_breaker {
        return Response::error_kind(ErrorKind::Validation, "circuit breaker disabled");
    }
    let reinstated = ctx.breaker.lock().reinstate(agent);
    if reinstated {
        ctx.bus.emit(Event::CircuitBreakerClosed {
            agent: agent.to_string(),
        });
    }
    Response::result(json!({ "reinstated": reinstated }))
}

pub(super) fn handle_check_breaker(ctx: &ListenCtx, agent: &str) -> Response {
    if !ctx.features.circuit_breaker {
        return Response::error_kind(ErrorKind::Validation, "circuit breaker disabled");
    }
    let now_ms = ctx.now_ms();
    let breaker = ctx.breaker.lock();
    match breaker.quarantine(agent, now_ms) {
        Some(q) => Response::result(json!({
            "quarantined": true,
            "until": hub_core::iso_utc(q.until_ms),
            "reason": q.reason,
        })),
        None => Response::result(json!({ "quarantined": false })),
    }
}

fn task_reply(task: &Task) -> Response {
    Response::result(json!({ "task": task }))
}

fn uuid_suffix() -> String {
    use hub_core::IdGen;
    let id = hub_core::UuidIdGen.next();
    id.split('-').next().unwrap_or("0").to_string()
}
