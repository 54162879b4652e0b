// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, feature-flagged wiring, startup,
//! periodic tasks, shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use hub_adapters::{
    FrictionGate, HeuristicFrictionGate, LocalWorkspaceProvider, NoopFrictionGate,
    NoopMetricsSource, SessionMetricsSource, WorkspaceProvider,
};
use hub_core::{Clock, Event, SystemClock, UuidIdGen, DEFAULT_REJECTION_ESCALATION_THRESHOLD};
use hub_engine::{
    check_board, AcceptanceConfig, AcceptanceRunner, AdaptiveConfig, AdaptiveSla, AssigneeResolver,
    BreakerConfig, CapabilityStore, CircuitBreaker, RouterConfig, SlaAction, SlaConfig, TrustStore,
    WorkflowEngine,
};
use hub_storage::{
    AccountsFile, BoardStore, EventLog, KnowledgeStore, MessageStore, RunStore, TokenStore,
    WorkspaceStore,
};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::event_bus::EventBus;
use crate::listener::{ListenCtx, Listener};
use crate::watchdog::Watchdog;
use crate::{env, event_bus};

/// Daemon configuration. All paths root at `hub_dir`.
#[derive(Debug, Clone)]
pub struct Config {
    pub hub_dir: PathBuf,
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub log_path: PathBuf,
    pub tokens_dir: PathBuf,
    pub tasks_path: PathBuf,
    pub events_path: PathBuf,
    pub messages_path: PathBuf,
    pub knowledge_path: PathBuf,
    pub runs_path: PathBuf,
    pub workspaces_path: PathBuf,
    pub accounts_path: PathBuf,
    pub workflows_dir: PathBuf,
    /// Root under which the local workspace provider materializes dirs.
    pub workspace_root: PathBuf,
    pub rejection_escalation_threshold: u32,
}

impl Config {
    /// Load configuration from the environment (`HUB_DIR` > `~/.hub`).
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_dir(env::hub_dir()?))
    }

    /// Configuration rooted at an explicit directory (tests).
    pub fn for_dir(hub_dir: impl Into<PathBuf>) -> Self {
        let hub_dir = hub_dir.into();
        Self {
            socket_path: hub_dir.join("hub.sock"),
            pid_path: hub_dir.join("daemon.pid"),
            log_path: hub_dir.join("daemon.log"),
            tokens_dir: hub_dir.join("tokens"),
            tasks_path: hub_dir.join("tasks.json"),
            events_path: hub_dir.join("events.ndjson"),
            messages_path: hub_dir.join("messages.json"),
            knowledge_path: hub_dir.join("knowledge.json"),
            runs_path: hub_dir.join("workflow-runs.json"),
            workspaces_path: hub_dir.join("workspaces.json"),
            accounts_path: hub_dir.join("accounts.json"),
            workflows_dir: hub_dir.join("workflows"),
            workspace_root: hub_dir.join("workspaces"),
            rejection_escalation_threshold: DEFAULT_REJECTION_ESCALATION_THRESHOLD,
            hub_dir,
        }
    }
}

/// Feature flags; each is independent.
///
/// `review_bundles`, `github_integration`, and `entire_monitoring` gate
/// external collaborators; the daemon carries the flags (they surface in
/// `health_check`) but instantiates nothing for them itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub streaming: bool,
    pub review_bundles: bool,
    pub auto_acceptance: bool,
    pub capability_routing: bool,
    pub sla_engine: bool,
    pub knowledge_index: bool,
    pub github_integration: bool,
    pub workflow: bool,
    pub retro: bool,
    pub sessions: bool,
    pub trust: bool,
    pub circuit_breaker: bool,
    pub entire_monitoring: bool,
    pub reliability: bool,
    pub cognitive_friction: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            streaming: true,
            review_bundles: true,
            auto_acceptance: true,
            capability_routing: true,
            sla_engine: true,
            knowledge_index: true,
            github_integration: true,
            workflow: true,
            retro: true,
            sessions: true,
            trust: true,
            circuit_breaker: true,
            entire_monitoring: true,
            reliability: true,
            cognitive_friction: true,
        }
    }
}

/// Injection points for collaborators that live outside the daemon.
pub struct ExternalDeps {
    pub metrics: Arc<dyn SessionMetricsSource>,
    pub workspace_provider: Option<Arc<dyn WorkspaceProvider>>,
    pub friction_gate: Option<Arc<dyn FrictionGate>>,
}

impl Default for ExternalDeps {
    fn default() -> Self {
        Self {
            metrics: Arc::new(NoopMetricsSource),
            workspace_provider: None,
            friction_gate: None,
        }
    }
}

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine hub directory")]
    NoHubDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful startup; spawn turns it into a running daemon.
pub struct StartupResult {
    pub ctx: Arc<ListenCtx>,
    listener: UnixListener,
    // NOTE(lifetime): held to maintain the exclusive pid lock
    lock_file: File,
}

/// A running daemon: listener plus periodic tasks.
pub struct DaemonHandle {
    pub ctx: Arc<ListenCtx>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
    #[allow(dead_code)]
    lock_file: File,
}

/// Start the daemon: lock, recover state, wire components, bind.
pub async fn startup(
    config: Config,
    features: Features,
    deps: ExternalDeps,
) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config.clone(), features, deps).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Lock failure means those files belong to the running daemon
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_files(&config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(
    config: Config,
    features: Features,
    deps: ExternalDeps,
) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.hub_dir)?;
    std::fs::create_dir_all(&config.workflows_dir)?;
    std::fs::create_dir_all(&config.workspace_root)?;

    // Acquire the pid lock FIRST; prevents double-daemon races. Avoid
    // truncating before the lock is held, or we'd wipe a live daemon's pid.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.pid_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    {
        use std::io::Write;
        let mut lock_file = &lock_file;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;
    }

    // Stores
    let board = BoardStore::new(&config.tasks_path);
    let messages = MessageStore::new(&config.messages_path);
    let knowledge = KnowledgeStore::new(&config.knowledge_path);
    let workspaces = WorkspaceStore::new(&config.workspaces_path);
    let tokens = TokenStore::new(&config.tokens_dir);
    let event_log = EventLog::new(&config.events_path);
    let runs = RunStore::new(&config.runs_path);

    // Engines
    let trust = Arc::new(Mutex::new(TrustStore::new()));
    let breaker = Arc::new(Mutex::new(CircuitBreaker::new(BreakerConfig::default())));
    let adaptive = Arc::new(Mutex::new(AdaptiveSla::new(AdaptiveConfig::default())));
    let router_config = RouterConfig::default();
    let sla_config = SlaConfig {
        check_interval: env::sla_check_interval()
            .unwrap_or(SlaConfig::default().check_interval),
        ..SlaConfig::default()
    };

    // Capability store: declared skills + stats recovered from the board
    let capabilities = Arc::new(Mutex::new(CapabilityStore::new()));
    {
        let mut capabilities = capabilities.lock();
        match AccountsFile::load(&config.accounts_path) {
            Ok(accounts) => capabilities.load_declared(&accounts),
            Err(e) => warn!(error = %e, "accounts.json unreadable; no declared skills"),
        }
        match board.load() {
            Ok(board) => capabilities.rebuild_from_board(&board),
            Err(e) => warn!(error = %e, "board unreadable at startup"),
        }
    }

    // Event bus + durable log + streaming fan-out
    let bus = EventBus::new(event_bus::DEFAULT_MAX_RECENT);
    {
        let event_log = event_log.clone();
        bus.on("*", move |envelope| {
            if let Err(e) = event_log.append(envelope) {
                warn!(error = %e, "event log append failed");
            }
        });
    }
    let subs = crate::subscriptions::SubscriptionRegistry::new();
    if features.streaming {
        let subs = subs.clone();
        bus.on("*", move |envelope| {
            subs.broadcast(envelope);
        });
    }

    // External collaborators (injectable; defaults are local/noop)
    let workspace_provider: Arc<dyn WorkspaceProvider> = deps
        .workspace_provider
        .unwrap_or_else(|| Arc::new(LocalWorkspaceProvider::new(&config.workspace_root)));
    let friction_gate: Arc<dyn FrictionGate> = deps.friction_gate.unwrap_or_else(|| {
        if features.cognitive_friction {
            Arc::new(HeuristicFrictionGate)
        } else {
            Arc::new(NoopFrictionGate)
        }
    });

    // Acceptance runner
    let bus_sink: Arc<dyn hub_core::EventSink> = Arc::new(bus.clone());
    let acceptance = Arc::new(AcceptanceRunner::new(
        board.clone(),
        messages.clone(),
        Arc::clone(&trust),
        Arc::clone(&bus_sink),
        Arc::clone(&friction_gate),
        AcceptanceConfig {
            rejection_escalation_threshold: config.rejection_escalation_threshold,
            ..AcceptanceConfig::default()
        },
        SystemClock,
    ));

    // Workflow engine, auto-assigning through the router
    let resolver: Arc<dyn AssigneeResolver> = Arc::new(RouterResolver {
        board: board.clone(),
        capabilities: Arc::clone(&capabilities),
        trust: Arc::clone(&trust),
        breaker: features.circuit_breaker.then(|| Arc::clone(&breaker)),
        router_config: router_config.clone(),
        clock: SystemClock,
    });
    let workflows = Arc::new(
        WorkflowEngine::new(runs, Arc::clone(&bus_sink), resolver, UuidIdGen, SystemClock)
            .with_retro(features.retro),
    );

    // Bind LAST, after everything that can fail
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    let ctx = Arc::new(ListenCtx {
        config,
        features,
        bus,
        subs,
        board,
        messages,
        knowledge,
        workspaces,
        tokens,
        event_log,
        trust,
        breaker,
        adaptive,
        capabilities,
        router_config,
        sla_config,
        metrics: deps.metrics,
        workspace_provider,
        acceptance,
        workflows,
        clock: SystemClock,
        start_time: Instant::now(),
        shutdown: Arc::new(Notify::new()),
        cancel_root: CancellationToken::new(),
        sessions: Arc::new(Mutex::new(std::collections::HashMap::new())),
    });

    info!("Daemon started");
    Ok(StartupResult {
        ctx,
        listener,
        lock_file,
    })
}

impl StartupResult {
    /// Spawn the listener and periodic tasks.
    pub fn spawn(self) -> DaemonHandle {
        let StartupResult {
            ctx,
            listener,
            lock_file,
        } = self;

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(
            Listener::new(listener, Arc::clone(&ctx)).run(),
        ));

        if ctx.features.sla_engine {
            let watchdog = Watchdog::new();
            let sweep = spawn_sla_sweep(Arc::clone(&ctx), watchdog.clone());
            if ctx.features.reliability {
                let stall_after = ctx.sla_config.check_interval * 3;
                let restart_ctx = Arc::clone(&ctx);
                let restart_watchdog = watchdog.clone();
                tasks.push(watchdog.spawn_monitor("sla-sweep", stall_after, sweep, move || {
                    spawn_sla_sweep(Arc::clone(&restart_ctx), restart_watchdog.clone())
                }));
            } else {
                tasks.push(sweep);
            }
        }

        tasks.push(spawn_event_log_prune(Arc::clone(&ctx)));

        DaemonHandle {
            ctx,
            tasks,
            lock_file,
        }
    }
}

impl DaemonHandle {
    /// Resolve when a shutdown request arrives over the socket.
    pub async fn wait_for_shutdown(&self) {
        self.ctx.shutdown.notified().await;
    }

    /// Stop tasks and remove lifecycle files.
    pub fn shutdown(&mut self) {
        info!("Shutting down daemon...");
        self.ctx.cancel_root.cancel();
        self.ctx.subs.destroy();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        cleanup_files(&self.ctx.config);
        info!("Daemon shutdown complete");
    }
}

/// Auto-assignment resolver backed by the capability router.
struct RouterResolver {
    board: BoardStore,
    capabilities: Arc<Mutex<CapabilityStore>>,
    trust: Arc<Mutex<TrustStore>>,
    breaker: Option<Arc<Mutex<CircuitBreaker>>>,
    router_config: RouterConfig,
    clock: SystemClock,
}

impl AssigneeResolver for RouterResolver {
    fn resolve(&self, skills: &[String]) -> Option<String> {
        crate::listener::routing::ranked_with(
            &self.board,
            &self.capabilities,
            &self.trust,
            self.breaker.as_ref(),
            &self.router_config,
            skills,
            Vec::new(),
            self.clock.epoch_ms(),
        )
        .into_iter()
        .next()
        .map(|scored| scored.account_name)
    }
}

/// Periodic classic SLA sweep over the board.
fn spawn_sla_sweep(ctx: Arc<ListenCtx>, watchdog: Watchdog) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ctx.sla_config.check_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            watchdog.pulse();

            let board = match ctx.board.load() {
                Ok(board) => board,
                Err(e) => {
                    warn!(error = %e, "sla sweep could not load board");
                    continue;
                }
            };

            let now_ms = ctx.clock.epoch_ms();
            for finding in check_board(&board, now_ms, &ctx.sla_config) {
                match finding.action {
                    SlaAction::Ping => {
                        ctx.bus.emit(Event::SlaWarning {
                            task_id: finding.task_id,
                            trigger: "stale".to_string(),
                            action: finding.action.as_str().to_string(),
                        });
                    }
                    SlaAction::ReassignSuggestion | SlaAction::Escalate => {
                        ctx.bus.emit(Event::SlaBreach {
                            task_id: finding.task_id,
                            trigger: "stale".to_string(),
                            action: finding.action.as_str().to_string(),
                        });
                    }
                }
            }
        }
    })
}

/// Hourly event-log prune.
fn spawn_event_log_prune(ctx: Arc<ListenCtx>) -> tokio::task::JoinHandle<()> {
    let interval_duration = env::prune_interval().unwrap_or(Duration::from_secs(60 * 60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval_duration);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Skip the immediate first tick
        interval.tick().await;
        loop {
            interval.tick().await;
            match ctx.event_log.prune(ctx.clock.epoch_ms()) {
                Ok(0) => {}
                Ok(dropped) => info!(dropped, "pruned event log"),
                Err(e) => warn!(error = %e, "event log prune failed"),
            }
        }
    })
}

/// Remove socket and pid files (startup failure or shutdown).
fn cleanup_files(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.pid_path.exists() {
        let _ = std::fs::remove_file(&config.pid_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
