// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hub` - CLI front-end for the hub daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hub", version, about = "Multi-agent coordination hub")]
struct Cli {
    /// Account to act as (token must exist under ${HUB_DIR}/tokens/)
    #[arg(long, short, env = "HUB_ACCOUNT", default_value = "operator", global = true)]
    account: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the daemon process
    Daemon {
        #[command(subcommand)]
        command: commands::daemon::DaemonCommand,
    },

    /// Manage accounts and their tokens
    Account {
        #[command(subcommand)]
        command: commands::accounts::AccountCommand,
    },

    /// List accounts known to the daemon
    ListAccounts,

    /// Work with tasks on the board
    Task {
        #[command(subcommand)]
        command: commands::task::TaskCommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Daemon { command } => commands::daemon::run(command, &cli.account).await,
        Command::Account { command } => commands::accounts::run(command),
        Command::ListAccounts => commands::accounts::list(&cli.account).await,
        Command::Task { command } => commands::task::run(command, &cli.account).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
