// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message store, including handoff records.
//!
//! A handoff is a message whose `context` is `"handoff"` and whose body is a
//! JSON-encoded handoff payload; the acceptance runner looks handoffs up by
//! task (and optionally branch), newest first.

use crate::atomic::{load_json, save_json_atomic};
use crate::board::BoardError;
use crate::lock::{DirLock, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_LOCK_TTL};
use hub_core::HandoffRecord;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Context tag marking a message as a handoff.
pub const HANDOFF_CONTEXT: &str = "handoff";

/// One stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub from: String,
    pub to: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MessageFile {
    #[serde(default)]
    messages: Vec<Message>,
}

/// File-backed message store (`messages.json`).
#[derive(Debug, Clone)]
pub struct MessageStore {
    path: PathBuf,
}

impl MessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one message.
    pub fn send(&self, message: Message) -> Result<(), BoardError> {
        let _lock = DirLock::acquire(&self.path, DEFAULT_LOCK_TTL, DEFAULT_ACQUIRE_TIMEOUT)?;
        let mut file: MessageFile = load_json(&self.path)?.unwrap_or_default();
        file.messages.push(message);
        save_json_atomic(&self.path, &file)?;
        Ok(())
    }

    /// Count unread messages addressed to an account.
    pub fn count_unread(&self, account: &str) -> Result<usize, BoardError> {
        let file: MessageFile = load_json(&self.path)?.unwrap_or_default();
        Ok(file
            .messages
            .iter()
            .filter(|m| m.to == account && !m.read)
            .count())
    }

    /// Return up to `limit` unread messages for an account and mark them read.
    pub fn read_messages(&self, account: &str, limit: usize) -> Result<Vec<Message>, BoardError> {
        let _lock = DirLock::acquire(&self.path, DEFAULT_LOCK_TTL, DEFAULT_ACQUIRE_TIMEOUT)?;
        let mut file: MessageFile = load_json(&self.path)?.unwrap_or_default();

        let mut delivered = Vec::new();
        for message in file.messages.iter_mut() {
            if delivered.len() >= limit {
                break;
            }
            if message.to == account && !message.read {
                message.read = true;
                delivered.push(message.clone());
            }
        }

        if !delivered.is_empty() {
            save_json_atomic(&self.path, &file)?;
        }
        Ok(delivered)
    }

    /// The most recent handoff for a task, optionally narrowed by branch.
    pub fn latest_handoff(
        &self,
        task_id: &str,
        branch: Option<&str>,
    ) -> Result<Option<HandoffRecord>, BoardError> {
        let file: MessageFile = load_json(&self.path)?.unwrap_or_default();
        let found = file
            .messages
            .iter()
            .rev()
            .find(|m| {
                m.context.as_deref() == Some(HANDOFF_CONTEXT)
                    && m.task_id.as_deref() == Some(task_id)
                    && (branch.is_none() || m.branch.as_deref() == branch)
            })
            .map(|m| HandoffRecord {
                id: m.id.clone(),
                from: m.from.clone(),
                to: m.to.clone(),
                content: m.body.clone(),
                context: HANDOFF_CONTEXT.to_string(),
                timestamp: m.timestamp.clone(),
                task_id: m.task_id.clone(),
                branch: m.branch.clone(),
            });
        Ok(found)
    }

    /// Find a handoff message by id.
    pub fn handoff_by_id(&self, handoff_id: &str) -> Result<Option<HandoffRecord>, BoardError> {
        let file: MessageFile = load_json(&self.path)?.unwrap_or_default();
        Ok(file
            .messages
            .iter()
            .find(|m| m.id == handoff_id && m.context.as_deref() == Some(HANDOFF_CONTEXT))
            .map(|m| HandoffRecord {
                id: m.id.clone(),
                from: m.from.clone(),
                to: m.to.clone(),
                content: m.body.clone(),
                context: HANDOFF_CONTEXT.to_string(),
                timestamp: m.timestamp.clone(),
                task_id: m.task_id.clone(),
                branch: m.branch.clone(),
            }))
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
