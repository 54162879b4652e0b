// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON framing for the hub socket.
//!
//! One JSON object per line. Invalid JSON lines are discarded with a
//! warning; a line exceeding [`MAX_FRAME_BYTES`] is fatal for the
//! connection (the caller closes it).

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Maximum encoded frame size (1 MiB).
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Framing errors.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode one frame: JSON object plus trailing newline.
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, FrameError> {
    let mut bytes = serde_json::to_vec(msg)?;
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge {
            size: bytes.len(),
            max: MAX_FRAME_BYTES,
        });
    }
    bytes.push(b'\n');
    Ok(bytes)
}

/// Result of feeding bytes to the decoder.
///
/// A push can produce complete frames *and* detect an oversize tail in the
/// same call; the frames were valid traffic and must still be dispatched
/// before the caller closes the connection over the overflow.
#[derive(Debug, Default)]
pub struct Decoded {
    /// Complete frames parsed from this push, in arrival order.
    pub frames: Vec<serde_json::Value>,
    /// Size of the dropped line buffer when it grew past
    /// [`MAX_FRAME_BYTES`] without a newline. The connection must be
    /// closed once `frames` have been handled.
    pub overflow: Option<usize>,
}

/// Incremental line-buffer decoder.
///
/// Push raw socket bytes in; complete frames come out as JSON values.
/// Unparseable lines are skipped (per-message failure never kills the
/// connection); overflowing the buffer without a newline does.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every complete frame they finish.
    pub fn push(&mut self, bytes: &[u8]) -> Decoded {
        self.buffer.extend_from_slice(bytes);

        let mut decoded = Decoded::default();
        loop {
            let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = &line[..line.len() - 1]; // strip the newline
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            match serde_json::from_slice::<serde_json::Value>(line) {
                Ok(value) if value.is_object() => decoded.frames.push(value),
                Ok(_) => warn!("discarding non-object frame"),
                Err(e) => warn!(error = %e, "discarding invalid JSON frame"),
            }
        }

        if self.buffer.len() > MAX_FRAME_BYTES {
            decoded.overflow = Some(self.buffer.len());
            self.buffer.clear();
        }

        decoded
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
