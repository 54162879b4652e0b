//! Test helpers: an in-process daemon on a tempdir plus a raw socket client.

#![allow(dead_code)]

use hub_daemon::lifecycle::{self, Config, DaemonHandle, ExternalDeps, Features};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{
    unix::{OwnedReadHalf, OwnedWriteHalf},
    UnixStream,
};
use std::time::Duration;

/// Reply timeout for spec clients.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// A booted daemon with its isolated state directory.
pub struct Hub {
    pub config: Config,
    daemon: Option<DaemonHandle>,
    _dir: tempfile::TempDir,
}

impl Hub {
    /// Boot a daemon with tokens for `alice` (token `T`) and `bob` (`B`).
    pub async fn boot() -> Self {
        Self::boot_with(Features::default()).await
    }

    pub async fn boot_with(features: Features) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_dir(dir.path());

        std::fs::create_dir_all(&config.tokens_dir).unwrap();
        std::fs::write(config.tokens_dir.join("alice.token"), "T\n").unwrap();
        std::fs::write(config.tokens_dir.join("bob.token"), "B\n").unwrap();

        let startup = lifecycle::startup(config.clone(), features, ExternalDeps::default())
            .await
            .expect("daemon should start");
        let daemon = startup.spawn();

        Self {
            config,
            daemon: Some(daemon),
            _dir: dir,
        }
    }

    /// Connect without authenticating.
    pub async fn connect_raw(&self) -> Wire {
        let stream = UnixStream::connect(&self.config.socket_path)
            .await
            .expect("socket should accept connections");
        let (reader, writer) = stream.into_split();
        Wire {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Connect and authenticate.
    pub async fn client(&self, account: &str, token: &str) -> Wire {
        let mut wire = self.connect_raw().await;
        let reply = wire
            .request(json!({"type": "auth", "account": account, "token": token}))
            .await;
        assert_eq!(reply["type"], "auth_ok", "auth should succeed: {reply}");
        wire
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        if let Some(mut daemon) = self.daemon.take() {
            daemon.shutdown();
        }
    }
}

/// A raw NDJSON connection.
pub struct Wire {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Wire {
    /// Assemble a wire from split socket halves.
    pub fn from_parts(reader: OwnedReadHalf, writer: OwnedWriteHalf) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Send one frame verbatim.
    pub async fn send(&mut self, frame: Value) {
        let mut line = frame.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    /// Write raw bytes (malformed-input specs).
    pub async fn send_raw(&mut self, bytes: &str) {
        self.writer.write_all(bytes.as_bytes()).await.unwrap();
    }

    /// Read the next frame, panicking on timeout or EOF.
    pub async fn read_frame(&mut self) -> Value {
        self.try_read_frame()
            .await
            .expect("expected a frame before EOF")
    }

    /// Read the next frame; `None` at EOF.
    pub async fn try_read_frame(&mut self) -> Option<Value> {
        let mut line = String::new();
        let read = tokio::time::timeout(REPLY_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for frame")
            .expect("socket read failed");
        if read == 0 {
            return None;
        }
        Some(serde_json::from_str(line.trim()).expect("daemon frames are valid JSON"))
    }

    /// Send a request with a requestId and await the matching reply.
    pub async fn request(&mut self, mut frame: Value) -> Value {
        static NEXT: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
        let id = format!(
            "spec-{}",
            NEXT.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
        );
        frame
            .as_object_mut()
            .unwrap()
            .insert("requestId".to_string(), Value::String(id.clone()));
        self.send(frame).await;

        loop {
            let reply = self.read_frame().await;
            if reply.get("requestId").and_then(Value::as_str) == Some(id.as_str()) {
                return reply;
            }
        }
    }

    /// Read frames until one matches `predicate` (skipping heartbeats etc).
    pub async fn wait_for(&mut self, predicate: impl Fn(&Value) -> bool) -> Value {
        for _ in 0..50 {
            let frame = self.read_frame().await;
            if predicate(&frame) {
                return frame;
            }
        }
        panic!("expected frame did not arrive");
    }
}
