// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability routing handlers.

use super::ListenCtx;
use crate::protocol::Response;
use hub_core::ErrorKind;
use hub_engine::{rank, RankOptions, ScoredAccount};
use serde_json::json;
use std::collections::HashSet;

/// Rank candidates for a skill set, honoring quarantines and workloads.
///
/// Shared by the `suggest_assignee` handler, adaptive reassignment, and the
/// workflow auto-assignment resolver (which holds the same components
/// without a `ListenCtx`).
pub(crate) fn ranked_with(
    board: &hub_storage::BoardStore,
    capabilities: &std::sync::Arc<parking_lot::Mutex<hub_engine::CapabilityStore>>,
    trust: &std::sync::Arc<parking_lot::Mutex<hub_engine::TrustStore>>,
    breaker: Option<&std::sync::Arc<parking_lot::Mutex<hub_engine::CircuitBreaker>>>,
    router_config: &hub_engine::RouterConfig,
    skills: &[String],
    extra_exclude: Vec<String>,
    now_ms: u64,
) -> Vec<ScoredAccount> {
    // Fold current trust scores into the capability snapshot
    let capabilities = {
        let trust = trust.lock();
        let mut capabilities = capabilities.lock();
        for record in trust.all() {
            capabilities.set_trust(&record.agent, record.trust_score);
        }
        capabilities.all()
    };

    let mut exclude: HashSet<String> = extra_exclude.into_iter().collect();
    if let Some(breaker) = breaker {
        exclude.extend(breaker.lock().quarantined_accounts(now_ms));
    }

    let workloads = match board.load() {
        Ok(board) => board.workloads(now_ms),
        Err(_) => Default::default(),
    };

    rank(
        &capabilities,
        skills,
        &RankOptions {
            exclude_accounts: exclude,
            workloads,
        },
        router_config,
        now_ms,
    )
}

pub(crate) fn ranked(
    ctx: &ListenCtx,
    skills: &[String],
    extra_exclude: Vec<String>,
) -> Vec<ScoredAccount> {
    ranked_with(
        &ctx.board,
        &ctx.capabilities,
        &ctx.trust,
        ctx.features.circuit_breaker.then_some(&ctx.breaker),
        &ctx.router_config,
        skills,
        extra_exclude,
        ctx.now_ms(),
    )
}

pub(super) fn handle_suggest(
    ctx: &ListenCtx,
    skills: &[String],
    exclude: Vec<String>,
) -> Response {
    if !ctx.features.capability_routing {
        return Response::error_kind(ErrorKind::Validation, "capability routing disabled");
    }

    let candidates: Vec<_> = ranked(ctx, skills, exclude)
        .into_iter()
        .map(|s| {
            json!({
                "accountName": s.account_name,
                "score": s.score,
                "reasons": s.reasons,
            })
        })
        .collect();

    Response::result(json!({ "candidates": candidates }))
}
