// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_adapters::SessionMetrics;

const T0: u64 = 1_700_000_000_000;
const MINUTE: u64 = 60_000;

fn task(id: &str) -> Task {
    let mut task = Task::new(id, "work", T0);
    task.start("alice", T0).unwrap();
    task
}

fn healthy_metrics() -> SessionMetrics {
    SessionMetrics {
        account: "alice".to_string(),
        burn_rate: 100.0,
        average_burn_rate: 100.0,
        last_checkpoint_ms: Some(T0),
        context_saturation: 0.3,
        phase: SessionPhase::Active,
        unresponsive_since_ms: None,
    }
}

fn engine() -> AdaptiveSla {
    AdaptiveSla::new(AdaptiveConfig::default())
}

#[test]
fn healthy_session_produces_nothing() {
    let mut engine = engine();
    let finding = engine.evaluate(
        &task("t1"),
        &healthy_metrics(),
        &TaskCharacteristics::default(),
        T0 + MINUTE,
    );
    assert!(finding.is_none());
}

#[test]
fn burn_rate_spike_pings() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.burn_rate = 250.0; // > 2x average

    let finding = engine
        .evaluate(&task("t1"), &metrics, &TaskCharacteristics::default(), T0 + MINUTE)
        .unwrap();
    assert_eq!(finding.trigger, AdaptiveTrigger::TokenBurnRate);
    assert_eq!(finding.action, AdaptiveAction::Ping);
    assert_eq!(finding.event, AdaptiveEventKind::ResourceWarning);
}

#[test]
fn checkpoint_silence_warns() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.last_checkpoint_ms = Some(T0);

    let finding = engine
        .evaluate(
            &task("t1"),
            &metrics,
            &TaskCharacteristics::default(),
            T0 + 15 * MINUTE,
        )
        .unwrap();
    assert_eq!(finding.trigger, AdaptiveTrigger::NoCheckpoint);
    assert_eq!(finding.action, AdaptiveAction::Ping);
    assert_eq!(finding.event, AdaptiveEventKind::SlaWarning);
}

#[test]
fn saturation_suggests_reassign_for_normal_work() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.context_saturation = 0.92;

    let finding = engine
        .evaluate(&task("t1"), &metrics, &TaskCharacteristics::default(), T0 + MINUTE)
        .unwrap();
    assert_eq!(finding.trigger, AdaptiveTrigger::ContextSaturation);
    assert_eq!(finding.action, AdaptiveAction::SuggestReassign);
}

#[test]
fn session_end_auto_reassigns_critical_work() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.phase = SessionPhase::Ended;

    let characteristics = TaskCharacteristics {
        criticality: Some(Criticality::Critical),
        reversibility: Some(Reversibility::Reversible),
    };
    let finding = engine
        .evaluate(&task("t1"), &metrics, &characteristics, T0 + MINUTE)
        .unwrap();
    assert_eq!(finding.trigger, AdaptiveTrigger::SessionEndedIncomplete);
    assert_eq!(finding.action, AdaptiveAction::AutoReassign);
    assert_eq!(finding.event, AdaptiveEventKind::SlaBreach);
}

#[test]
fn irreversible_work_escalates_to_human() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.phase = SessionPhase::Ended;

    let characteristics = TaskCharacteristics {
        criticality: Some(Criticality::Critical),
        reversibility: Some(Reversibility::Irreversible),
    };
    let finding = engine
        .evaluate(&task("t1"), &metrics, &characteristics, T0 + MINUTE)
        .unwrap();
    assert_eq!(finding.action, AdaptiveAction::EscalateHuman);
}

#[test]
fn deep_unresponsiveness_terminates() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    // Unresponsive for 2x the 10-minute threshold
    metrics.unresponsive_since_ms = Some(T0);

    let characteristics = TaskCharacteristics {
        criticality: Some(Criticality::Critical),
        reversibility: Some(Reversibility::Irreversible),
    };
    let now = T0 + 20 * MINUTE;
    let finding = engine
        .evaluate(&task("t1"), &metrics, &characteristics, now)
        .unwrap();
    assert_eq!(finding.action, AdaptiveAction::Terminate);
    assert_eq!(finding.event, AdaptiveEventKind::SlaBreach);
}

#[test]
fn cooldown_suppresses_repeat_interventions() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.unresponsive_since_ms = Some(T0);
    let characteristics = TaskCharacteristics {
        criticality: Some(Criticality::Critical),
        reversibility: Some(Reversibility::Irreversible),
    };

    let now = T0 + 20 * MINUTE;
    let first = engine.evaluate(&task("t1"), &metrics, &characteristics, now);
    assert!(first.is_some());

    // Within cooldownMinutes: nothing fires, however bad the metrics
    let second = engine.evaluate(&task("t1"), &metrics, &characteristics, now + 5 * MINUTE);
    assert!(second.is_none());

    // After the cooldown it can fire again
    let third = engine.evaluate(&task("t1"), &metrics, &characteristics, now + 16 * MINUTE);
    assert!(third.is_some());
}

#[test]
fn pings_do_not_arm_the_cooldown() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.burn_rate = 300.0;

    let first = engine
        .evaluate(&task("t1"), &metrics, &TaskCharacteristics::default(), T0 + MINUTE)
        .unwrap();
    assert_eq!(first.action, AdaptiveAction::Ping);

    let second = engine.evaluate(
        &task("t1"),
        &metrics,
        &TaskCharacteristics::default(),
        T0 + 2 * MINUTE,
    );
    assert!(second.is_some(), "pings are repeatable");
}

#[test]
fn cooldowns_are_per_task() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.phase = SessionPhase::Ended;

    let now = T0 + MINUTE;
    assert!(engine
        .evaluate(&task("t1"), &metrics, &TaskCharacteristics::default(), now)
        .is_some());
    assert!(
        engine
            .evaluate(&task("t2"), &metrics, &TaskCharacteristics::default(), now)
            .is_some(),
        "t1's cooldown must not shadow t2"
    );
}

#[test]
fn non_in_progress_tasks_are_ignored() {
    let mut engine = engine();
    let mut metrics = healthy_metrics();
    metrics.phase = SessionPhase::Ended;

    let idle = Task::new("t1", "todo", T0);
    assert!(engine
        .evaluate(&idle, &metrics, &TaskCharacteristics::default(), T0)
        .is_none());
}
