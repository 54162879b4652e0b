// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hub daemon start|stop|status`

use crate::client::{expect_result, hub_dir, Client};
use anyhow::{bail, Context};
use clap::Subcommand;
use hub_daemon::protocol::Request;
use std::io::BufRead;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// How long `daemon start` waits for the READY line.
const START_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop a running daemon
    Stop,
    /// Show daemon health
    Status,
}

pub async fn run(command: DaemonCommand, account: &str) -> anyhow::Result<()> {
    match command {
        DaemonCommand::Start => start(),
        DaemonCommand::Stop => stop(account).await,
        DaemonCommand::Status => status(account).await,
    }
}

/// Locate the `hubd` binary: `HUB_DAEMON_BINARY` override, then a sibling
/// of the current executable, then `$PATH`.
fn daemon_binary() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("HUB_DAEMON_BINARY") {
        return path.into();
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("hubd");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    "hubd".into()
}

fn start() -> anyhow::Result<()> {
    let hub_dir = hub_dir()?;
    let socket_path = hub_dir.join("hub.sock");
    if socket_path.exists() && std::os::unix::net::UnixStream::connect(&socket_path).is_ok() {
        println!("daemon already running");
        return Ok(());
    }

    let mut child = Command::new(daemon_binary())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn hubd")?;

    // Wait for the READY line
    let stdout = child.stdout.take().context("no stdout from hubd")?;
    let mut lines = std::io::BufReader::new(stdout).lines();
    let deadline = Instant::now() + START_TIMEOUT;
    loop {
        if Instant::now() > deadline {
            let _ = child.kill();
            bail!(
                "daemon did not become ready within {}s; check {}",
                START_TIMEOUT.as_secs(),
                hub_dir.join("daemon.log").display()
            );
        }
        match lines.next() {
            Some(Ok(line)) if line.trim() == "READY" => break,
            Some(Ok(_)) => continue,
            Some(Err(e)) => bail!("error reading hubd output: {e}"),
            None => {
                bail!(
                    "hubd exited before READY; check {}",
                    hub_dir.join("daemon.log").display()
                );
            }
        }
    }

    println!("daemon started (socket: {})", socket_path.display());
    Ok(())
}

async fn stop(account: &str) -> anyhow::Result<()> {
    let mut client = Client::connect(account).await?;
    expect_result(client.request(Request::Shutdown).await?)?;
    println!("daemon stopping");
    Ok(())
}

async fn status(account: &str) -> anyhow::Result<()> {
    let mut client = match Client::connect(account).await {
        Ok(client) => client,
        Err(e) => {
            println!("daemon: not running ({e})");
            std::process::exit(1);
        }
    };

    let health = expect_result(client.request(Request::HealthCheck).await?)?;
    println!("daemon: running");
    if let Some(uptime) = health.get("uptimeSeconds").and_then(|v| v.as_u64()) {
        println!("  uptime: {}", hub_core::format_elapsed(uptime));
    }
    if let Some(version) = health.get("version").and_then(|v| v.as_str()) {
        println!("  version: {version}");
    }
    if let Some(subscribers) = health.get("subscribers").and_then(|v| v.as_u64()) {
        println!("  subscribers: {subscribers}");
    }
    if let Some(tasks) = health.get("tasks").and_then(|v| v.as_object()) {
        let summary: Vec<String> = tasks
            .iter()
            .map(|(status, count)| format!("{status}={count}"))
            .collect();
        println!("  tasks: {}", summary.join(" "));
    }
    Ok(())
}
