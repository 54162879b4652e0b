// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hub account …` and `hub list-accounts`

use crate::client::{expect_result, hub_dir, Client};
use anyhow::{bail, Context};
use clap::Subcommand;
use hub_core::is_valid_account_name;
use hub_daemon::protocol::Request;
use serde_json::Value;

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Create an account token under ${HUB_DIR}/tokens/
    Create {
        name: String,
    },
}

pub fn run(command: AccountCommand) -> anyhow::Result<()> {
    match command {
        AccountCommand::Create { name } => create(&name),
    }
}

fn create(name: &str) -> anyhow::Result<()> {
    if !is_valid_account_name(name) {
        bail!("invalid account name: {name}");
    }
    let tokens_dir = hub_dir()?.join("tokens");
    std::fs::create_dir_all(&tokens_dir).context("could not create tokens directory")?;

    let token_path = tokens_dir.join(format!("{name}.token"));
    if token_path.exists() {
        bail!("account already exists: {name}");
    }

    let token = uuid::Uuid::new_v4().to_string();
    std::fs::write(&token_path, format!("{token}\n"))?;

    // Tokens are secrets; owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&token_path, std::fs::Permissions::from_mode(0o600))?;
    }

    println!("created account '{name}' ({})", token_path.display());
    Ok(())
}

pub async fn list(account: &str) -> anyhow::Result<()> {
    let mut client = Client::connect(account).await?;
    let reply = expect_result(client.request(Request::ListAccounts).await?)?;

    let accounts = reply
        .get("accounts")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if accounts.is_empty() {
        println!("no accounts");
        return Ok(());
    }
    for entry in accounts {
        let name = entry.get("name").and_then(Value::as_str).unwrap_or("?");
        let skills: Vec<&str> = entry
            .get("skills")
            .and_then(Value::as_array)
            .map(|s| s.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if skills.is_empty() {
            println!("{name}");
        } else {
            println!("{name}  [{}]", skills.join(", "));
        }
    }
    Ok(())
}
