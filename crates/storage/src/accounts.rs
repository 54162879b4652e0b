// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declared account configuration.
//!
//! `accounts.json` is operator-maintained: it declares each account's skills
//! and provider type. Runtime statistics (delivery counts, recency) come
//! from the board; this file only carries what cannot be derived.

use crate::atomic::load_json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Declared properties of one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
}

/// The `accounts.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsFile {
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl AccountsFile {
    /// Load from disk; a missing file declares no accounts.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let path = path.into();
        Ok(load_json(&path)?.unwrap_or_default())
    }

    pub fn get(&self, name: &str) -> Option<&AccountConfig> {
        self.accounts.iter().find(|a| a.name == name)
    }
}
