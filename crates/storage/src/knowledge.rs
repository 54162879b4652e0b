// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knowledge note store with naive token-overlap search.

use crate::atomic::{load_json, save_json_atomic};
use crate::board::BoardError;
use crate::lock::{DirLock, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_LOCK_TTL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An indexed note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub account: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub indexed_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    notes: Vec<Note>,
}

/// File-backed note index (`knowledge.json`).
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    path: PathBuf,
}

impl KnowledgeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Add a note to the index.
    pub fn index(&self, note: Note) -> Result<(), BoardError> {
        let _lock = DirLock::acquire(&self.path, DEFAULT_LOCK_TTL, DEFAULT_ACQUIRE_TIMEOUT)?;
        let mut file: KnowledgeFile = load_json(&self.path)?.unwrap_or_default();
        file.notes.push(note);
        save_json_atomic(&self.path, &file)?;
        Ok(())
    }

    /// Search notes by token overlap with the query.
    ///
    /// Scoring: one point per query token found in the title or tags, half a
    /// point (scaled x2 internally) per token found only in the body. Ties
    /// break toward newer notes.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Note>, BoardError> {
        let file: KnowledgeFile = load_json(&self.path)?.unwrap_or_default();
        let tokens: Vec<String> = tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(u32, usize, &Note)> = file
            .notes
            .iter()
            .enumerate()
            .filter_map(|(idx, note)| {
                let title = note.title.to_lowercase();
                let body = note.body.to_lowercase();
                let tags: Vec<String> = note.tags.iter().map(|t| t.to_lowercase()).collect();

                let mut score = 0u32;
                for token in &tokens {
                    if title.contains(token) || tags.iter().any(|t| t.contains(token.as_str())) {
                        score += 2;
                    } else if body.contains(token) {
                        score += 1;
                    }
                }
                (score > 0).then_some((score, idx, note))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        Ok(scored.into_iter().take(limit).map(|(_, _, n)| n.clone()).collect())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
#[path = "knowledge_tests.rs"]
mod tests;
