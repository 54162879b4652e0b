// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow run scheduler.
//!
//! Drives runs through their step DAG: schedules steps whose dependencies
//! are terminal, evaluates step conditions (skipping re-schedules so that
//! freshly-unblocked steps go out in the same call), handles completion,
//! failure/retry/abort, and cancellation.

use hub_core::{Clock, Event, EventSink, IdGen};
use hub_storage::{BoardError, RunStore, UpdateError, WorkflowRuns};
use hub_workflow::{
    condition, validate_dag, ConditionError, OnFailure, RunStatus, StepFacts, StepRun,
    StepRunStatus, ValidateError, WorkflowDef, WorkflowRun, AUTO_ASSIGN,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Cap on error text carried in step-failure events.
const MAX_ERROR_LEN: usize = 300;

/// Step-run result recorded when a condition gates a step off.
const RESULT_CONDITION_NOT_MET: &str = "condition_not_met";
/// Step-run result recorded when an abort cascades.
const RESULT_ABORTED: &str = "aborted_due_to_failure";
/// Step-run result recorded on run cancellation.
const RESULT_CANCELLED: &str = "cancelled";

/// Workflow engine errors.
#[derive(Debug, Error)]
pub enum WorkflowEngineError {
    #[error(transparent)]
    Store(#[from] BoardError),

    #[error(transparent)]
    Invalid(#[from] ValidateError),

    #[error("workflow run not found: {0}")]
    RunNotFound(String),

    #[error("step '{step_id}' not found in run {run_id}")]
    StepNotFound { run_id: String, step_id: String },

    #[error("condition for step '{0}' failed to evaluate: {1}")]
    Condition(String, ConditionError),
}

impl From<UpdateError<WorkflowEngineError>> for WorkflowEngineError {
    fn from(e: UpdateError<WorkflowEngineError>) -> Self {
        match e {
            UpdateError::Store(inner) => WorkflowEngineError::Store(inner),
            UpdateError::Op(op) => op,
        }
    }
}

/// Picks an account for `assign = "auto"` steps.
pub trait AssigneeResolver: Send + Sync {
    fn resolve(&self, skills: &[String]) -> Option<String>;
}

/// Resolver wrapping a plain function (tests, single-account setups).
pub struct FnResolver<F>(pub F);

impl<F> AssigneeResolver for FnResolver<F>
where
    F: Fn(&[String]) -> Option<String> + Send + Sync,
{
    fn resolve(&self, skills: &[String]) -> Option<String> {
        (self.0)(skills)
    }
}

/// The run scheduler.
pub struct WorkflowEngine<I: IdGen, C: Clock> {
    store: RunStore,
    sink: Arc<dyn EventSink>,
    resolver: Arc<dyn AssigneeResolver>,
    ids: I,
    clock: C,
    /// When false, finished runs never enter `retro_in_progress`.
    retro_enabled: bool,
}

impl<I: IdGen, C: Clock> WorkflowEngine<I, C> {
    pub fn new(
        store: RunStore,
        sink: Arc<dyn EventSink>,
        resolver: Arc<dyn AssigneeResolver>,
        ids: I,
        clock: C,
    ) -> Self {
        Self {
            store,
            sink,
            resolver,
            ids,
            clock,
            retro_enabled: true,
        }
    }

    pub fn with_retro(mut self, retro_enabled: bool) -> Self {
        self.retro_enabled = retro_enabled;
        self
    }

    /// Validate and start a run: one pending step run per step, then an
    /// initial scheduling pass.
    pub fn trigger(
        &self,
        def: &WorkflowDef,
        trigger_context: Value,
    ) -> Result<WorkflowRun, WorkflowEngineError> {
        validate_dag(def)?;

        let run_id = self.ids.next();
        let now_ms = self.clock.epoch_ms();
        let run = WorkflowRun {
            id: run_id.clone(),
            workflow_name: def.name.clone(),
            status: RunStatus::Running,
            trigger_context,
            started_at_ms: now_ms,
            completed_at_ms: None,
            retro_id: None,
        };

        let step_runs: Vec<StepRun> = def
            .steps
            .iter()
            .map(|step| StepRun::pending(self.ids.next(), run_id.clone(), step.id.clone()))
            .collect();

        self.store
            .update(|runs| -> Result<(), WorkflowEngineError> {
                runs.runs.insert(run_id.clone(), run.clone());
                for step_run in &step_runs {
                    runs.step_runs.insert(step_run.id.clone(), step_run.clone());
                }
                Ok(())
            })?;

        self.sink.emit(Event::WorkflowStarted {
            run_id: run_id.clone(),
            workflow: def.name.clone(),
        });

        self.schedule_ready(&run_id, def)?;

        let runs = self.store.load()?;
        runs.runs
            .get(&run_id)
            .cloned()
            .ok_or(WorkflowEngineError::RunNotFound(run_id))
    }

    /// Assign every pending step whose dependencies are all terminal.
    ///
    /// Condition-gated steps that evaluate false are skipped, and the pass
    /// repeats so steps unblocked by the skip schedule in the same call.
    /// Idempotent: already-assigned steps are untouched.
    pub fn schedule_ready(&self, run_id: &str, def: &WorkflowDef) -> Result<(), WorkflowEngineError> {
        let now_ms = self.clock.epoch_ms();
        let resolver = Arc::clone(&self.resolver);

        let events = self
            .store
            .update(|runs| -> Result<Vec<Event>, WorkflowEngineError> {
                let run = runs
                    .runs
                    .get(run_id)
                    .ok_or_else(|| WorkflowEngineError::RunNotFound(run_id.to_string()))?
                    .clone();
                if run.status != RunStatus::Running {
                    return Ok(Vec::new());
                }

                let mut events = Vec::new();
                loop {
                    let mut skipped_any = false;

                    let terminal_ids: HashSet<String> = runs
                        .steps_for(run_id)
                        .iter()
                        .filter(|sr| sr.status.is_terminal())
                        .map(|sr| sr.step_id.clone())
                        .collect();

                    let ready: Vec<String> = runs
                        .steps_for(run_id)
                        .iter()
                        .filter(|sr| sr.status == StepRunStatus::Pending)
                        .filter(|sr| {
                            def.step(&sr.step_id)
                                .map(|s| s.depends_on.iter().all(|d| terminal_ids.contains(d)))
                                .unwrap_or(false)
                        })
                        .map(|sr| sr.step_id.clone())
                        .collect();

                    for step_id in ready {
                        let Some(step) = def.step(&step_id) else {
                            continue;
                        };

                        if let Some(cond) = &step.condition {
                            let facts = step_facts(runs, run_id);
                            let ctx = condition::EvalContext {
                                steps: &facts,
                                trigger_context: &run.trigger_context,
                            };
                            let met = condition::check(&cond.when, &ctx).map_err(|e| {
                                WorkflowEngineError::Condition(step_id.clone(), e)
                            })?;
                            if !met {
                                if let Some(sr) = runs.step_mut(run_id, &step_id) {
                                    sr.status = StepRunStatus::Skipped;
                                    sr.result = Some(RESULT_CONDITION_NOT_MET.to_string());
                                    sr.completed_at_ms = Some(now_ms);
                                }
                                skipped_any = true;
                                continue;
                            }
                        }

                        let assignee = if step.assign == AUTO_ASSIGN {
                            match resolver.resolve(&step.skills) {
                                Some(account) => account,
                                None => {
                                    // Stay pending; a later pass may find a
                                    // routable account.
                                    warn!(run_id, step_id = %step_id, "no routable assignee");
                                    continue;
                                }
                            }
                        } else {
                            step.assign.clone()
                        };

                        if let Some(sr) = runs.step_mut(run_id, &step_id) {
                            sr.status = StepRunStatus::Assigned;
                            sr.assigned_to = Some(assignee.clone());
                            sr.started_at_ms = Some(now_ms);
                        }
                        events.push(Event::WorkflowStepStarted {
                            run_id: run_id.to_string(),
                            step_id: step_id.clone(),
                            assigned_to: assignee,
                        });
                    }

                    if !skipped_any {
                        break;
                    }
                }

                // Completion check: every step run terminal ends the run
                events.extend(finish_if_complete(
                    runs,
                    run_id,
                    def,
                    self.retro_enabled,
                    now_ms,
                    &self.ids,
                ));

                Ok(events)
            })?;

        for event in events {
            self.sink.emit(event);
        }
        Ok(())
    }

    /// A step's work came back reviewed: `accepted`, `rejected`, or `failed`.
    pub fn on_step_completed(
        &self,
        run_id: &str,
        step_id: &str,
        result: &str,
        def: &WorkflowDef,
    ) -> Result<(), WorkflowEngineError> {
        let now_ms = self.clock.epoch_ms();

        let event = self
            .store
            .update(|runs| -> Result<Event, WorkflowEngineError> {
                let sr = runs.step_mut(run_id, step_id).ok_or_else(|| {
                    WorkflowEngineError::StepNotFound {
                        run_id: run_id.to_string(),
                        step_id: step_id.to_string(),
                    }
                })?;
                sr.status = StepRunStatus::Completed;
                sr.result = Some(result.to_string());
                sr.completed_at_ms = Some(now_ms);
                let duration_ms = sr
                    .started_at_ms
                    .map(|started| now_ms.saturating_sub(started))
                    .unwrap_or(0);
                Ok(Event::WorkflowStepCompleted {
                    run_id: run_id.to_string(),
                    step_id: step_id.to_string(),
                    result: result.to_string(),
                    duration_ms,
                })
            })?;

        self.sink.emit(event);
        self.schedule_ready(run_id, def)
    }

    /// A step failed outright.
    pub fn on_step_failed(
        &self,
        run_id: &str,
        step_id: &str,
        error: &str,
        def: &WorkflowDef,
    ) -> Result<(), WorkflowEngineError> {
        let now_ms = self.clock.epoch_ms();
        let max_retries = def.max_retries;

        let (events, reschedule) = self.store.update(
            |runs| -> Result<(Vec<Event>, bool), WorkflowEngineError> {
                let sr = runs.step_mut(run_id, step_id).ok_or_else(|| {
                    WorkflowEngineError::StepNotFound {
                        run_id: run_id.to_string(),
                        step_id: step_id.to_string(),
                    }
                })?;

                let attempt = sr.attempt;
                let will_retry = attempt <= max_retries;
                let mut events = vec![Event::WorkflowStepFailed {
                    run_id: run_id.to_string(),
                    step_id: step_id.to_string(),
                    error: truncate(error, MAX_ERROR_LEN),
                    attempt,
                    will_retry,
                }];

                if will_retry {
                    sr.reset_for_retry();
                    return Ok((events, true));
                }

                sr.status = StepRunStatus::Failed;
                sr.result = Some(truncate(error, MAX_ERROR_LEN));
                sr.completed_at_ms = Some(now_ms);

                if def.on_failure == OnFailure::Abort {
                    for other in runs.step_runs.values_mut() {
                        if other.run_id == run_id && !other.status.is_terminal() {
                            other.status = StepRunStatus::Skipped;
                            other.result = Some(RESULT_ABORTED.to_string());
                            other.completed_at_ms = Some(now_ms);
                        }
                    }
                    if let Some(run) = runs.runs.get_mut(run_id) {
                        run.status = RunStatus::Failed;
                        run.completed_at_ms = Some(now_ms);
                    }
                    events.push(Event::WorkflowCompleted {
                        run_id: run_id.to_string(),
                        status: RunStatus::Failed.to_string(),
                    });
                    return Ok((events, false));
                }

                // notify / exhausted retry: keep scheduling what's possible
                Ok((events, true))
            },
        )?;

        for event in events {
            self.sink.emit(event);
        }
        if reschedule {
            self.schedule_ready(run_id, def)?;
        }
        Ok(())
    }

    /// Cancel a run: every non-terminal step run is skipped.
    pub fn cancel(&self, run_id: &str) -> Result<(), WorkflowEngineError> {
        let now_ms = self.clock.epoch_ms();

        self.store
            .update(|runs| -> Result<(), WorkflowEngineError> {
                if runs.runs.get(run_id).is_none() {
                    return Err(WorkflowEngineError::RunNotFound(run_id.to_string()));
                }
                for sr in runs.step_runs.values_mut() {
                    if sr.run_id == run_id && !sr.status.is_terminal() {
                        sr.status = StepRunStatus::Skipped;
                        sr.result = Some(RESULT_CANCELLED.to_string());
                        sr.completed_at_ms = Some(now_ms);
                    }
                }
                if let Some(run) = runs.runs.get_mut(run_id) {
                    run.status = RunStatus::Cancelled;
                    run.completed_at_ms = Some(now_ms);
                }
                Ok(())
            })?;

        self.sink.emit(Event::WorkflowCancelled {
            run_id: run_id.to_string(),
        });
        Ok(())
    }

    /// Read access for handlers.
    pub fn runs(&self) -> Result<WorkflowRuns, WorkflowEngineError> {
        Ok(self.store.load()?)
    }
}

/// Facts visible to downstream step conditions.
fn step_facts(runs: &WorkflowRuns, run_id: &str) -> HashMap<String, StepFacts> {
    runs.steps_for(run_id)
        .iter()
        .map(|sr| {
            let duration_ms = match (sr.started_at_ms, sr.completed_at_ms) {
                (Some(started), Some(completed)) => Some(completed.saturating_sub(started)),
                _ => None,
            };
            (
                sr.step_id.clone(),
                StepFacts {
                    result: sr.result.clone(),
                    duration_ms,
                    assignee: sr.assigned_to.clone(),
                },
            )
        })
        .collect()
}

/// Close out the run when every step run is terminal.
fn finish_if_complete<I: IdGen>(
    runs: &mut WorkflowRuns,
    run_id: &str,
    def: &WorkflowDef,
    retro_enabled: bool,
    now_ms: u64,
    ids: &I,
) -> Vec<Event> {
    let steps: Vec<&StepRun> = runs.steps_for(run_id);
    if steps.is_empty() || !steps.iter().all(|sr| sr.status.is_terminal()) {
        return Vec::new();
    }
    let has_participant = steps.iter().any(|sr| sr.assigned_to.is_some());

    let Some(run) = runs.runs.get_mut(run_id) else {
        return Vec::new();
    };
    if run.status != RunStatus::Running {
        return Vec::new();
    }

    run.status = if retro_enabled && def.retro && has_participant {
        run.retro_id = Some(ids.next());
        RunStatus::RetroInProgress
    } else {
        RunStatus::Completed
    };
    run.completed_at_ms = Some(now_ms);

    vec![Event::WorkflowCompleted {
        run_id: run_id.to_string(),
        status: run.status.to_string(),
    }]
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
