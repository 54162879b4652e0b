// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health and account handlers.

use super::ListenCtx;
use crate::protocol::Response;
use serde_json::json;

pub(super) fn handle_ping() -> Response {
    Response::result(json!({ "pong": true }))
}

pub(super) fn handle_health_check(ctx: &ListenCtx) -> Response {
    let uptime_s = ctx.start_time.elapsed().as_secs();

    let task_counts = match ctx.board.load() {
        Ok(board) => {
            let mut counts = std::collections::BTreeMap::new();
            for task in board.tasks.values() {
                *counts.entry(task.status.to_string()).or_insert(0u32) += 1;
            }
            json!(counts)
        }
        Err(_) => json!(null),
    };

    Response::result(json!({
        "status": "ok",
        "uptimeSeconds": uptime_s,
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": ctx.sessions.lock().len(),
        "subscribers": ctx.subs.len(),
        "tasks": task_counts,
        "features": ctx.features,
    }))
}

pub(super) fn handle_list_accounts(ctx: &ListenCtx) -> Response {
    let accounts = match ctx.tokens.list_accounts() {
        Ok(accounts) => accounts,
        Err(e) => return Response::error(format!("token store error: {e}")),
    };

    let capabilities = ctx.capabilities.lock();
    let entries: Vec<_> = accounts
        .into_iter()
        .map(|name| {
            let capability = capabilities.get(&name);
            json!({
                "name": name,
                "skills": capability.map(|c| c.skills.clone()).unwrap_or_default(),
                "providerType": capability.and_then(|c| c.provider_type.clone()),
            })
        })
        .collect();

    Response::result(json!({ "accounts": entries }))
}
