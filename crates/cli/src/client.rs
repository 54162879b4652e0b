// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket client: connect, authenticate, exchange framed requests.

use anyhow::{anyhow, bail, Context};
use hub_daemon::protocol::Request;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{
    unix::{OwnedReadHalf, OwnedWriteHalf},
    UnixStream,
};

/// Per-request reply timeout.
const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve the hub directory the same way the daemon does.
pub fn hub_dir() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("HUB_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".hub"))
}

/// An authenticated connection to the daemon.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_request_id: u64,
}

impl Client {
    /// Connect and authenticate as `account`.
    ///
    /// The token is read from `${hubDir}/tokens/<account>.token`; the CLI
    /// runs on the same host as the daemon and shares its filesystem trust.
    pub async fn connect(account: &str) -> anyhow::Result<Self> {
        let hub_dir = hub_dir()?;
        let socket_path = hub_dir.join("hub.sock");
        let token_path = hub_dir.join("tokens").join(format!("{account}.token"));

        let token = std::fs::read_to_string(&token_path)
            .with_context(|| {
                format!(
                    "no token for account '{account}' (expected {}); try `hub account create {account}`",
                    token_path.display()
                )
            })?
            .trim()
            .to_string();

        let stream = UnixStream::connect(&socket_path)
            .await
            .with_context(|| format!("daemon not reachable at {}", socket_path.display()))?;
        let (reader, writer) = stream.into_split();

        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
            next_request_id: 1,
        };

        let reply = client
            .request(Request::Auth {
                account: account.to_string(),
                token,
            })
            .await?;
        match reply.get("type").and_then(Value::as_str) {
            Some("auth_ok") => Ok(client),
            Some("auth_fail") => bail!(
                "authentication failed: {}",
                reply.get("error").and_then(Value::as_str).unwrap_or("?")
            ),
            other => bail!("unexpected auth reply: {other:?}"),
        }
    }

    /// Send one request and await its reply, skipping stream frames.
    pub async fn request(&mut self, request: Request) -> anyhow::Result<Value> {
        let request_id = format!("cli-{}", self.next_request_id);
        self.next_request_id += 1;

        let mut value = serde_json::to_value(&request)?;
        value
            .as_object_mut()
            .ok_or_else(|| anyhow!("request must be an object"))?
            .insert("requestId".to_string(), Value::String(request_id.clone()));

        let mut line = serde_json::to_string(&value)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;

        // Replies carry our requestId; stream events and heartbeats don't
        let deadline = tokio::time::Instant::now() + REPLY_TIMEOUT;
        loop {
            let mut reply_line = String::new();
            let read = tokio::time::timeout_at(deadline, self.reader.read_line(&mut reply_line))
                .await
                .map_err(|_| anyhow!("timed out waiting for daemon reply"))??;
            if read == 0 {
                bail!("daemon closed the connection");
            }
            let reply: Value = match serde_json::from_str(reply_line.trim()) {
                Ok(reply) => reply,
                Err(_) => continue,
            };
            if reply.get("requestId").and_then(Value::as_str) == Some(&request_id) {
                return Ok(reply);
            }
        }
    }
}

/// Fail with the daemon's error message when the reply is an error.
pub fn expect_result(reply: Value) -> anyhow::Result<Value> {
    match reply.get("type").and_then(Value::as_str) {
        Some("result") => Ok(reply),
        Some("error") => bail!(
            "{}",
            reply.get("error").and_then(Value::as_str).unwrap_or("daemon error")
        ),
        other => bail!("unexpected reply type: {other:?}"),
    }
}
