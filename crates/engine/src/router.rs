// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability-based routing scorer.
//!
//! The score is six weighted components summing to at most 100, plus a
//! workload modifier that may be negative; the final score is clamped to
//! `>= 0`. Rounding happens once, on the component sum.

use hub_core::{CapabilityRecord, WorkloadSnapshot};
use std::collections::{HashMap, HashSet};

/// Component weight caps.
const SKILL_MAX: f64 = 30.0;
const SUCCESS_MAX: f64 = 25.0;
const PROVIDER_MAX: f64 = 20.0;
const SPEED_MAX: f64 = 10.0;
const TRUST_MAX: f64 = 10.0;
const RECENCY_MAX: f64 = 5.0;

/// Workload penalty/bonus clamps.
const WIP_PENALTY_PER_TASK: i32 = -5;
const WIP_PENALTY_FLOOR: i32 = -15;
const OPEN_PENALTY_PER_TASK: i32 = -2;
const OPEN_PENALTY_FLOOR: i32 = -10;
const THROUGHPUT_BONUS_PER_TASK: i32 = 5;
const THROUGHPUT_BONUS_CAP: i32 = 15;

/// Router configuration: declared provider strengths.
///
/// When a provider type has no strengths entry the provider-fit component
/// falls back to neutral (10).
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    pub provider_strengths: HashMap<String, Vec<String>>,
}

impl RouterConfig {
    pub fn with_strengths(
        mut self,
        provider: impl Into<String>,
        strengths: Vec<String>,
    ) -> Self {
        self.provider_strengths.insert(provider.into(), strengths);
        self
    }
}

/// One scored candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredAccount {
    pub account_name: String,
    pub score: i32,
    pub reasons: Vec<String>,
}

/// Score one capability record against a required skill set.
///
/// `now_ms` anchors the recency component; `workload` contributes the final
/// modifier when present.
pub fn score(
    capability: &CapabilityRecord,
    required_skills: &[String],
    workload: Option<&WorkloadSnapshot>,
    config: &RouterConfig,
    now_ms: u64,
) -> ScoredAccount {
    let mut reasons = Vec::new();

    // Skill match: full marks when nothing is required
    let skill = if required_skills.is_empty() {
        SKILL_MAX
    } else {
        let have: HashSet<&str> = capability.skills.iter().map(String::as_str).collect();
        let matching = required_skills
            .iter()
            .filter(|s| have.contains(s.as_str()))
            .count();
        let component = SKILL_MAX * matching as f64 / required_skills.len() as f64;
        reasons.push(format!("skills {}/{}", matching, required_skills.len()));
        component
    };

    // Success rate: neutral 13 with no history
    let success = if capability.total_tasks == 0 {
        reasons.push("no history".to_string());
        13.0
    } else {
        let rate = capability.accepted_tasks as f64 / capability.total_tasks as f64;
        reasons.push(format!(
            "accepted {}/{}",
            capability.accepted_tasks, capability.total_tasks
        ));
        SUCCESS_MAX * rate
    };

    // Provider fit: declared strengths against required skills, else neutral
    let provider = match (
        required_skills.is_empty(),
        capability
            .provider_type
            .as_deref()
            .and_then(|p| config.provider_strengths.get(p)),
    ) {
        (false, Some(strengths)) => {
            let pool: HashSet<&str> = strengths.iter().map(String::as_str).collect();
            let matching = required_skills
                .iter()
                .filter(|s| pool.contains(s.as_str()))
                .count();
            reasons.push(format!("provider fit {}/{}", matching, required_skills.len()));
            PROVIDER_MAX * matching as f64 / required_skills.len() as f64
        }
        _ => 10.0,
    };

    // Speed: banded on average delivery time
    let speed = match capability.avg_delivery_ms {
        None => 5.0,
        Some(ms) => {
            let minutes = ms as f64 / 60_000.0;
            if minutes < 5.0 {
                SPEED_MAX
            } else if minutes < 15.0 {
                8.0
            } else if minutes < 30.0 {
                5.0
            } else {
                2.0
            }
        }
    };

    // Trust: scaled score, neutral 5 when absent
    let trust = match capability.trust_score {
        Some(ts) => TRUST_MAX * ts.clamp(0, 100) as f64 / 100.0,
        None => 5.0,
    };

    // Recency: banded on minutes since last activity
    let recency = match capability.last_active_at {
        Some(at) => {
            let minutes = now_ms.saturating_sub(at) as f64 / 60_000.0;
            if minutes <= 10.0 {
                RECENCY_MAX
            } else if minutes <= 30.0 {
                4.0
            } else if minutes <= 60.0 {
                2.0
            } else {
                1.0
            }
        }
        None => 1.0,
    };

    let base = (skill + success + provider + speed + trust + recency).round() as i32;

    let modifier = workload.map(workload_modifier).unwrap_or(0);
    if modifier != 0 {
        reasons.push(format!("workload {:+}", modifier));
    }

    ScoredAccount {
        account_name: capability.account_name.clone(),
        score: (base + modifier).max(0),
        reasons,
    }
}

/// Workload modifier: wip and open-task penalties, throughput bonus.
pub fn workload_modifier(workload: &WorkloadSnapshot) -> i32 {
    let wip = (WIP_PENALTY_PER_TASK * workload.wip_count as i32).clamp(WIP_PENALTY_FLOOR, 0);
    let open = (OPEN_PENALTY_PER_TASK * workload.open_count as i32).clamp(OPEN_PENALTY_FLOOR, 0);
    let bonus = (THROUGHPUT_BONUS_PER_TASK * workload.recent_throughput as i32)
        .clamp(0, THROUGHPUT_BONUS_CAP);
    wip + open + bonus
}

/// Options for [`rank`].
#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    pub exclude_accounts: HashSet<String>,
    pub workloads: HashMap<String, WorkloadSnapshot>,
}

/// Rank candidates for a skill set, best first.
///
/// Excluded accounts are dropped before scoring. The sort is stable, so
/// equal scores keep caller-supplied input order; callers should make that
/// order deterministic.
pub fn rank(
    capabilities: &[CapabilityRecord],
    required_skills: &[String],
    options: &RankOptions,
    config: &RouterConfig,
    now_ms: u64,
) -> Vec<ScoredAccount> {
    let mut scored: Vec<ScoredAccount> = capabilities
        .iter()
        .filter(|c| !options.exclude_accounts.contains(&c.account_name))
        .map(|c| {
            score(
                c,
                required_skills,
                options.workloads.get(&c.account_name),
                config,
                now_ms,
            )
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
