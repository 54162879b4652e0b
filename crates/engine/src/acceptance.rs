// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-acceptance: runs a submitted task's verification commands and moves
//! the board accordingly.
//!
//! `begin` is the synchronous part (handoff lookup, friction gate) so the
//! RPC handler can reply `running`/`blocked` immediately; the suite itself
//! runs in a spawned task and reports exclusively through events. Nothing
//! in here propagates errors back into the RPC layer.

use hub_adapters::{stream_command, CommandStatus, FrictionGate, FrictionVerdict, OutputLine};
use hub_core::{
    Clock, Event, EventSink, HandoffPayload, HandoffRecord, TaskOutcome, TaskStatus,
    VerificationReceipt,
};
use hub_storage::{BoardStore, MessageStore};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::trust::TrustStore;

/// Acceptance tuning.
#[derive(Debug, Clone)]
pub struct AcceptanceConfig {
    /// Forward command output as `TDD_TEST_OUTPUT` events.
    pub streaming: bool,
    /// Per-command timeout.
    pub command_timeout: Duration,
    /// Overall suite timeout for one workspace.
    pub suite_timeout: Duration,
    pub rejection_escalation_threshold: u32,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            streaming: true,
            command_timeout: hub_adapters::subprocess::ACCEPTANCE_COMMAND_TIMEOUT,
            suite_timeout: hub_adapters::subprocess::ACCEPTANCE_SUITE_TIMEOUT,
            rejection_escalation_threshold: hub_core::DEFAULT_REJECTION_ESCALATION_THRESHOLD,
        }
    }
}

/// Immediate reply for the submitting client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptanceOutcome {
    /// Friction gate wants a human; nothing was started.
    Blocked { reason: String, level: String },
    /// Suite spawned; verdict arrives via `TASK_VERIFIED`.
    Running,
    /// No handoff, no commands, or no workspace: nothing to verify.
    NoSuite,
}

/// The acceptance pipeline.
pub struct AcceptanceRunner<C: Clock> {
    board: BoardStore,
    messages: MessageStore,
    trust: Arc<Mutex<TrustStore>>,
    sink: Arc<dyn EventSink>,
    gate: Arc<dyn FrictionGate>,
    config: AcceptanceConfig,
    clock: C,
}

impl<C: Clock + 'static> AcceptanceRunner<C> {
    pub fn new(
        board: BoardStore,
        messages: MessageStore,
        trust: Arc<Mutex<TrustStore>>,
        sink: Arc<dyn EventSink>,
        gate: Arc<dyn FrictionGate>,
        config: AcceptanceConfig,
        clock: C,
    ) -> Self {
        Self {
            board,
            messages,
            trust,
            sink,
            gate,
            config,
            clock,
        }
    }

    /// Kick off acceptance for a task that just entered review.
    ///
    /// Synchronous part only; on `Running` the suite continues in a spawned
    /// task linked to `cancel`.
    pub fn begin(self: Arc<Self>, task_id: &str, cancel: CancellationToken) -> AcceptanceOutcome {
        let (workspace, branch) = match self.board.load() {
            Ok(board) => match board.get(task_id).and_then(|t| t.workspace_context.clone()) {
                Some(ctx) => (ctx.workspace_path, Some(ctx.branch)),
                None => {
                    info!(task_id, "no workspace context; skipping auto-acceptance");
                    return AcceptanceOutcome::NoSuite;
                }
            },
            Err(e) => {
                warn!(task_id, error = %e, "board unreadable; skipping auto-acceptance");
                return AcceptanceOutcome::NoSuite;
            }
        };

        let handoff = match self.messages.latest_handoff(task_id, branch.as_deref()) {
            Ok(Some(handoff)) => handoff,
            Ok(None) => {
                info!(task_id, "no handoff record; skipping auto-acceptance");
                return AcceptanceOutcome::NoSuite;
            }
            Err(e) => {
                warn!(task_id, error = %e, "handoff lookup failed");
                return AcceptanceOutcome::NoSuite;
            }
        };

        let payload = match handoff.payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(task_id, error = %e, "unparseable handoff payload");
                return AcceptanceOutcome::NoSuite;
            }
        };
        if payload.run_commands.is_empty() {
            return AcceptanceOutcome::NoSuite;
        }

        if let FrictionVerdict::Block { reason, level } = self.gate.evaluate(&payload) {
            self.sink.emit(Event::ResourceWarning {
                task_id: task_id.to_string(),
                agent: Some(handoff.to.clone()),
                trigger: "cognitive_friction".to_string(),
                detail: reason.clone(),
            });
            return AcceptanceOutcome::Blocked { reason, level };
        }

        let task_id = task_id.to_string();
        tokio::spawn(async move {
            self.run_suite(task_id, handoff, payload, workspace, cancel)
                .await;
        });
        AcceptanceOutcome::Running
    }

    /// Execute the suite and finalize board, receipt, and trust.
    async fn run_suite(
        &self,
        task_id: String,
        handoff: HandoffRecord,
        payload: HandoffPayload,
        workspace: PathBuf,
        cancel: CancellationToken,
    ) {
        self.sink.emit(Event::TddRunStarted {
            task_id: task_id.clone(),
            commands: payload.run_commands.clone(),
        });

        let (passed, summary) = self
            .execute_commands(&task_id, &payload.run_commands, &workspace, &cancel)
            .await;

        self.sink.emit(Event::TddRunCompleted {
            task_id: task_id.clone(),
            passed,
        });

        self.finalize(&task_id, &handoff, passed, &summary);
    }

    async fn execute_commands(
        &self,
        task_id: &str,
        commands: &[String],
        workspace: &std::path::Path,
        cancel: &CancellationToken,
    ) -> (bool, String) {
        let suite_deadline = tokio::time::Instant::now() + self.config.suite_timeout;

        for command in commands {
            let (tx, mut rx) = mpsc::channel::<OutputLine>(256);

            let forwarder = self.config.streaming.then(|| {
                let sink = Arc::clone(&self.sink);
                let task_id = task_id.to_string();
                let command = command.clone();
                tokio::spawn(async move {
                    while let Some(output) = rx.recv().await {
                        sink.emit(Event::TddTestOutput {
                            task_id: task_id.clone(),
                            command: command.clone(),
                            stream: output.stream,
                            line: output.line,
                        });
                    }
                })
            });

            let remaining = suite_deadline
                .checked_duration_since(tokio::time::Instant::now())
                .unwrap_or(Duration::ZERO);
            let timeout = self.config.command_timeout.min(remaining);

            let status = stream_command(command, workspace, timeout, cancel, &tx).await;
            drop(tx);
            if let Some(forwarder) = forwarder {
                let _ = forwarder.await;
            }

            match status {
                Ok(status) if status.passed() => continue,
                Ok(CommandStatus::Exited { code }) => {
                    return (
                        false,
                        format!("verification command failed ({}): exit {:?}", command, code),
                    );
                }
                Ok(CommandStatus::TimedOut) => {
                    return (false, format!("verification command timed out: {}", command));
                }
                Ok(CommandStatus::Cancelled) => {
                    return (false, format!("verification cancelled during: {}", command));
                }
                Err(e) => {
                    return (false, format!("verification command error ({}): {}", command, e));
                }
            }
        }
        (true, "all verification commands passed".to_string())
    }

    /// Board mutation, receipt, and trust accounting after the suite.
    fn finalize(&self, task_id: &str, handoff: &HandoffRecord, passed: bool, summary: &str) {
        let now_ms = self.clock.epoch_ms();
        let threshold = self.config.rejection_escalation_threshold;

        let result = self.board.update(|board| {
            let Some(task) = board.get_mut(task_id) else {
                return Ok(None);
            };
            if task.status != TaskStatus::ReadyForReview {
                // Review already resolved by a human; drop our verdict
                return Ok(None);
            }
            let agent = task.assignee.clone();
            let started_ms = task.entered_in_progress_ms();
            if passed {
                task.accept(now_ms)?;
            } else {
                task.reject(summary, threshold, now_ms)?;
            }
            Ok::<_, hub_core::TransitionError>(Some((agent, started_ms)))
        });

        let (agent, started_ms) = match result {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                info!(task_id, "task no longer awaiting review; dropping auto verdict");
                return;
            }
            Err(e) => {
                warn!(task_id, error = %e, "auto-acceptance could not finalize board");
                return;
            }
        };

        if passed {
            self.sink.emit(Event::TaskAccepted {
                task_id: task_id.to_string(),
                agent: agent.clone(),
            });
        } else {
            self.sink.emit(Event::TaskRejected {
                task_id: task_id.to_string(),
                agent: agent.clone(),
                reason: summary.to_string(),
            });
        }

        let receipt = VerificationReceipt {
            task_id: task_id.to_string(),
            delegator: handoff.from.clone(),
            delegatee: handoff.to.clone(),
            spec_payload_hash: payload_hash(&handoff.content),
            verdict: if passed { "passed" } else { "failed" }.to_string(),
            method: "auto-acceptance".to_string(),
            timestamp: hub_core::iso_utc(now_ms),
        };
        self.sink.emit(Event::TaskVerified { receipt, passed });

        if let Some(agent) = agent {
            let duration_minutes = started_ms.map(|s| now_ms.saturating_sub(s) / 60_000);
            let outcome = if passed {
                TaskOutcome::Completed
            } else {
                TaskOutcome::Failed
            };
            let delta = self
                .trust
                .lock()
                .record_outcome(&agent, outcome, duration_minutes);
            if delta.delta != 0 {
                self.sink.emit(Event::TrustUpdate {
                    agent,
                    delta: delta.delta,
                    score: delta.score,
                    reason: format!("auto-acceptance {}", if passed { "passed" } else { "failed" }),
                });
            }
        }
    }
}

/// SHA-256 of the handoff payload, hex-encoded.
fn payload_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
#[path = "acceptance_tests.rs"]
mod tests;
