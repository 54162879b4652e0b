// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hub task …`

use crate::client::{expect_result, Client};
use clap::Subcommand;
use hub_daemon::protocol::Request;
use serde_json::Value;

#[derive(Subcommand)]
pub enum TaskCommand {
    /// List tasks, optionally by status
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one task with its event history
    Show { id: String },
    /// Create a task
    Create {
        title: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Start working on a task
    Start { id: String },
    /// Submit a task for review
    Submit { id: String },
    /// Accept a reviewed task
    Accept { id: String },
    /// Reject a reviewed task
    Reject {
        id: String,
        #[arg(long)]
        reason: String,
    },
}

pub async fn run(command: TaskCommand, account: &str) -> anyhow::Result<()> {
    let mut client = Client::connect(account).await?;

    match command {
        TaskCommand::List { status } => {
            let reply = expect_result(client.request(Request::ListTasks { status }).await?)?;
            let tasks = reply
                .get("tasks")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if tasks.is_empty() {
                println!("no tasks");
                return Ok(());
            }
            for task in tasks {
                println!(
                    "{}  {}  {}  {}",
                    task.get("id").and_then(Value::as_str).unwrap_or("?"),
                    task.get("status").and_then(Value::as_str).unwrap_or("?"),
                    task.get("assignee").and_then(Value::as_str).unwrap_or("-"),
                    task.get("title").and_then(Value::as_str).unwrap_or(""),
                );
            }
        }
        TaskCommand::Show { id } => {
            let reply = expect_result(client.request(Request::GetTask { task_id: id }).await?)?;
            println!("{}", serde_json::to_string_pretty(&reply["task"])?);
        }
        TaskCommand::Create {
            title,
            id,
            description,
            tags,
        } => {
            let reply = expect_result(
                client
                    .request(Request::CreateTask {
                        title,
                        task_id: id,
                        description,
                        tags,
                        priority: None,
                    })
                    .await?,
            )?;
            println!(
                "created {}",
                reply["task"]["id"].as_str().unwrap_or("?")
            );
        }
        TaskCommand::Start { id } => {
            transition(&mut client, id, "in_progress", None).await?;
        }
        TaskCommand::Submit { id } => {
            let reply = expect_result(
                client
                    .request(Request::UpdateTaskStatus {
                        task_id: id,
                        status: "ready_for_review".to_string(),
                        reason: None,
                        workspace_context: None,
                    })
                    .await?,
            )?;
            let acceptance = &reply["acceptance"];
            if acceptance == "running" {
                println!("submitted; auto-acceptance running");
            } else if acceptance.get("blocked").is_some() {
                println!(
                    "submitted; auto-acceptance blocked: {}",
                    acceptance["blocked"]["reason"].as_str().unwrap_or("?")
                );
            } else {
                println!("submitted");
            }
        }
        TaskCommand::Accept { id } => {
            transition(&mut client, id, "accepted", None).await?;
        }
        TaskCommand::Reject { id, reason } => {
            transition(&mut client, id, "rejected", Some(reason)).await?;
        }
    }
    Ok(())
}

async fn transition(
    client: &mut Client,
    task_id: String,
    status: &str,
    reason: Option<String>,
) -> anyhow::Result<()> {
    let reply = expect_result(
        client
            .request(Request::UpdateTaskStatus {
                task_id,
                status: status.to_string(),
                reason,
                workspace_context: None,
            })
            .await?,
    )?;
    println!(
        "{} is now {}",
        reply["task"]["id"].as_str().unwrap_or("?"),
        reply["task"]["status"].as_str().unwrap_or("?"),
    );
    Ok(())
}
