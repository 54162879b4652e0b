// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handoff handlers: delegating responsibility for a task.

use super::{ConnState, ListenCtx};
use crate::protocol::Response;
use hub_core::{is_valid_account_name, ErrorKind, Event, HandoffPayload, IdGen, UuidIdGen};
use hub_storage::{Message, HANDOFF_CONTEXT};
use serde_json::json;

pub(super) fn handle_handoff(
    ctx: &ListenCtx,
    conn: &ConnState,
    task_id: &str,
    to: &str,
    payload: HandoffPayload,
) -> Response {
    if !is_valid_account_name(to) {
        return Response::error_kind(ErrorKind::Validation, format!("invalid recipient: {to}"));
    }
    if payload.goal.trim().is_empty() {
        return Response::error_kind(ErrorKind::Validation, "handoff payload needs a goal");
    }

    let board = match ctx.board.load() {
        Ok(board) => board,
        Err(e) => return Response::error(format!("board error: {e}")),
    };
    let Some(task) = board.get(task_id) else {
        return Response::error_kind(ErrorKind::NotFound, format!("task not found: {task_id}"));
    };
    let branch = task.workspace_context.as_ref().map(|w| w.branch.clone());

    let content = match serde_json::to_string(&payload) {
        Ok(content) => content,
        Err(e) => return Response::error(format!("unserializable payload: {e}")),
    };

    let handoff_id = UuidIdGen.next();
    let message = Message {
        id: handoff_id.clone(),
        from: conn.account.clone(),
        to: to.to_string(),
        body: content,
        context: Some(HANDOFF_CONTEXT.to_string()),
        read: false,
        timestamp: hub_core::iso_utc(ctx.now_ms()),
        task_id: Some(task_id.to_string()),
        branch,
    };
    if let Err(e) = ctx.messages.send(message) {
        return Response::error(format!("message store error: {e}"));
    }

    ctx.bus.emit(Event::DelegationRequested {
        handoff_id: handoff_id.clone(),
        task_id: task_id.to_string(),
        from: conn.account.clone(),
        to: to.to_string(),
    });

    if let Some(depth) = payload.delegation_depth.filter(|&d| d > 0) {
        ctx.bus.emit(Event::DelegationChain {
            task_id: task_id.to_string(),
            chain: vec![conn.account.clone(), to.to_string()],
            depth,
        });
    }

    Response::result(json!({ "handoffId": handoff_id }))
}

pub(super) fn handle_accept(ctx: &ListenCtx, conn: &ConnState, handoff_id: &str) -> Response {
    let handoff = match ctx.messages.handoff_by_id(handoff_id) {
        Ok(Some(handoff)) => handoff,
        Ok(None) => {
            return Response::error_kind(
                ErrorKind::NotFound,
                format!("handoff not found: {handoff_id}"),
            )
        }
        Err(e) => return Response::error(format!("message store error: {e}")),
    };
    if handoff.to != conn.account {
        return Response::error_kind(
            ErrorKind::Validation,
            format!("handoff {handoff_id} is addressed to {}", handoff.to),
        );
    }

    ctx.bus.emit(Event::DelegationAccepted {
        handoff_id: handoff_id.to_string(),
        to: conn.account.clone(),
    });

    // Accepting a handoff starts the task when it's startable
    let task = handoff.task_id.as_deref().and_then(|task_id| {
        let now_ms = ctx.now_ms();
        let started = ctx.board.update(|board| {
            let task = board
                .get_mut(task_id)
                .ok_or_else(|| super::tasks::TaskOpError::NotFound(task_id.to_string()))?;
            task.start(&conn.account, now_ms)?;
            Ok::<_, super::tasks::TaskOpError>(task.clone())
        });
        match started {
            Ok(task) => {
                ctx.bus.emit(Event::TaskStarted {
                    task_id: task.id.clone(),
                    agent: conn.account.clone(),
                });
                Some(task)
            }
            Err(_) => None, // already in flight; acceptance still stands
        }
    });

    Response::result(json!({ "accepted": true, "task": task }))
}
