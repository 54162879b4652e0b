// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adaptive SLA: reacts to session resource signals instead of wall clock.
//!
//! Trigger detection follows the resource tables; action selection walks a
//! fixed ladder (terminate → escalate-human → reassign → ping). A per-task
//! cooldown suppresses repeated interventions: any action stronger than a
//! ping arms it.

use hub_adapters::{SessionMetrics, SessionPhase};
use hub_core::{Criticality, Reversibility, Task, TaskStatus};
use std::collections::HashMap;
use std::time::Duration;

/// Adaptive engine tuning.
#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    /// Burn-rate trigger fires above `multiplier * average`.
    pub burn_multiplier: f64,
    /// Checkpoint silence budget.
    pub checkpoint_max: Duration,
    /// Context saturation trigger threshold.
    pub saturation_threshold: f64,
    /// Unresponsiveness budget; terminate past `threshold * terminate_multiplier`.
    pub unresponsive_threshold: Duration,
    pub terminate_multiplier: u32,
    /// Per-task cooldown between adaptive interventions.
    pub cooldown: Duration,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            burn_multiplier: 2.0,
            checkpoint_max: Duration::from_secs(10 * 60),
            saturation_threshold: 0.80,
            unresponsive_threshold: Duration::from_secs(10 * 60),
            terminate_multiplier: 2,
            cooldown: Duration::from_secs(15 * 60),
        }
    }
}

/// What fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveTrigger {
    TokenBurnRate,
    NoCheckpoint,
    ContextSaturation,
    SessionEndedIncomplete,
    /// Session unresponsive past the terminate budget; not one of the four
    /// resource triggers but it must be able to fire on its own.
    Unresponsive,
}

impl AdaptiveTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdaptiveTrigger::TokenBurnRate => "token_burn_rate",
            AdaptiveTrigger::NoCheckpoint => "no_checkpoint",
            AdaptiveTrigger::ContextSaturation => "context_saturation",
            AdaptiveTrigger::SessionEndedIncomplete => "session_ended_incomplete",
            AdaptiveTrigger::Unresponsive => "unresponsive",
        }
    }
}

/// Selected intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveAction {
    Ping,
    SuggestReassign,
    AutoReassign,
    EscalateHuman,
    Terminate,
}

impl AdaptiveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdaptiveAction::Ping => "ping",
            AdaptiveAction::SuggestReassign => "suggest_reassign",
            AdaptiveAction::AutoReassign => "auto_reassign",
            AdaptiveAction::EscalateHuman => "escalate_human",
            AdaptiveAction::Terminate => "terminate",
        }
    }

    /// Pings don't arm the cooldown; everything stronger does.
    fn arms_cooldown(&self) -> bool {
        !matches!(self, AdaptiveAction::Ping)
    }
}

/// Which event the daemon should emit for a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveEventKind {
    SlaBreach,
    SlaWarning,
    ResourceWarning,
}

/// Risk characteristics pulled from the task's latest handoff payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCharacteristics {
    pub criticality: Option<Criticality>,
    pub reversibility: Option<Reversibility>,
}

/// One adaptive intervention decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveFinding {
    pub task_id: String,
    pub trigger: AdaptiveTrigger,
    pub action: AdaptiveAction,
    pub event: AdaptiveEventKind,
}

/// Adaptive SLA engine with per-task cooldowns.
#[derive(Debug, Default)]
pub struct AdaptiveSla {
    config: AdaptiveConfig,
    /// task id → epoch ms when the cooldown was armed.
    cooldowns: HashMap<String, u64>,
}

impl AdaptiveSla {
    pub fn new(config: AdaptiveConfig) -> Self {
        Self {
            config,
            cooldowns: HashMap::new(),
        }
    }

    /// Evaluate one in-progress task against its session metrics.
    ///
    /// Returns `None` when no trigger fires, the task is not in progress,
    /// or the task is cooling down from a previous intervention.
    pub fn evaluate(
        &mut self,
        task: &Task,
        metrics: &SessionMetrics,
        characteristics: &TaskCharacteristics,
        now_ms: u64,
    ) -> Option<AdaptiveFinding> {
        if task.status != TaskStatus::InProgress {
            return None;
        }
        if self.cooling_down(&task.id, now_ms) {
            return None;
        }

        let trigger = self.detect_trigger(metrics, now_ms)?;
        let action = self.determine_action(trigger, metrics, characteristics, now_ms);

        if action.arms_cooldown() {
            self.cooldowns.insert(task.id.clone(), now_ms);
        }

        Some(AdaptiveFinding {
            task_id: task.id.clone(),
            trigger,
            action,
            event: event_kind(trigger),
        })
    }

    fn cooling_down(&self, task_id: &str, now_ms: u64) -> bool {
        self.cooldowns
            .get(task_id)
            .map(|&armed| now_ms.saturating_sub(armed) < self.config.cooldown.as_millis() as u64)
            .unwrap_or(false)
    }

    /// Trigger detection, most severe first.
    fn detect_trigger(&self, metrics: &SessionMetrics, now_ms: u64) -> Option<AdaptiveTrigger> {
        if self.unresponsive_past_terminate_budget(metrics, now_ms) {
            return Some(AdaptiveTrigger::Unresponsive);
        }
        if metrics.phase == SessionPhase::Ended {
            return Some(AdaptiveTrigger::SessionEndedIncomplete);
        }
        if metrics.context_saturation > self.config.saturation_threshold {
            return Some(AdaptiveTrigger::ContextSaturation);
        }
        if metrics.average_burn_rate > 0.0
            && metrics.burn_rate > self.config.burn_multiplier * metrics.average_burn_rate
        {
            return Some(AdaptiveTrigger::TokenBurnRate);
        }
        if let Some(checkpoint_ms) = metrics.last_checkpoint_ms {
            if now_ms.saturating_sub(checkpoint_ms) > self.config.checkpoint_max.as_millis() as u64
            {
                return Some(AdaptiveTrigger::NoCheckpoint);
            }
        }
        None
    }

    fn unresponsive_past_terminate_budget(&self, metrics: &SessionMetrics, now_ms: u64) -> bool {
        let budget = self.config.unresponsive_threshold.as_millis() as u64
            * self.config.terminate_multiplier as u64;
        metrics
            .unresponsive_since_ms
            .map(|since| now_ms.saturating_sub(since) >= budget)
            .unwrap_or(false)
    }

    /// Action ladder.
    fn determine_action(
        &self,
        trigger: AdaptiveTrigger,
        metrics: &SessionMetrics,
        characteristics: &TaskCharacteristics,
        now_ms: u64,
    ) -> AdaptiveAction {
        // 1. Unresponsive past the terminate budget always terminates
        if self.unresponsive_past_terminate_budget(metrics, now_ms) {
            return AdaptiveAction::Terminate;
        }

        // 2. Irreversible work is never reassigned automatically
        if characteristics.reversibility == Some(Reversibility::Irreversible) {
            return AdaptiveAction::EscalateHuman;
        }

        // 3. Dead or saturated sessions get reassignment, strength by criticality
        match trigger {
            AdaptiveTrigger::SessionEndedIncomplete | AdaptiveTrigger::ContextSaturation => {
                let critical = matches!(
                    characteristics.criticality,
                    Some(Criticality::High) | Some(Criticality::Critical)
                );
                if critical {
                    AdaptiveAction::AutoReassign
                } else {
                    AdaptiveAction::SuggestReassign
                }
            }
            // 4. Burn-rate and checkpoint anomalies only warrant a nudge
            AdaptiveTrigger::TokenBurnRate
            | AdaptiveTrigger::NoCheckpoint
            | AdaptiveTrigger::Unresponsive => AdaptiveAction::Ping,
        }
    }
}

fn event_kind(trigger: AdaptiveTrigger) -> AdaptiveEventKind {
    match trigger {
        AdaptiveTrigger::SessionEndedIncomplete | AdaptiveTrigger::Unresponsive => {
            AdaptiveEventKind::SlaBreach
        }
        AdaptiveTrigger::NoCheckpoint => AdaptiveEventKind::SlaWarning,
        AdaptiveTrigger::TokenBurnRate | AdaptiveTrigger::ContextSaturation => {
            AdaptiveEventKind::ResourceWarning
        }
    }
}

#[cfg(test)]
#[path = "adaptive_tests.rs"]
mod tests;
