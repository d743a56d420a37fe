// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Task commands

use beray_rest_client::{CreateTaskRequest, RestClient, TaskStatus};
use clap::Subcommand;
use futures::StreamExt;
use std::io::Write;

use crate::output::Output;

/// Task-related commands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Start a new agent task
    Create {
        /// What the agent should accomplish
        #[arg(long)]
        goal: String,
        /// Enable a tool (repeatable); the service default applies when omitted
        #[arg(long)]
        tool: Vec<String>,
    },
    /// List your tasks
    List {
        /// Only show tasks in this state
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Show one task
    Get { id: i64 },
    /// Ask a running task to stop
    Stop { id: i64 },
    /// Delete a task and its workspace
    Delete { id: i64 },
    /// Follow live task events until the stream ends
    Stream { id: i64 },
}

impl TaskCommands {
    /// Execute the task command
    pub async fn run(self, client: &RestClient, output: &Output) -> anyhow::Result<()> {
        match self {
            TaskCommands::Create { goal, tool } => {
                let mut request = CreateTaskRequest::new(goal);
                if !tool.is_empty() {
                    request = request.with_tools(tool);
                }
                output.print_value(&client.create_task(&request).await?)
            }
            TaskCommands::List { status } => {
                let tasks: Vec<_> = client
                    .list_tasks()
                    .await?
                    .into_iter()
                    .filter(|task| status.as_ref().map_or(true, |s| &task.status == s))
                    .collect();
                output.print_list(&tasks)
            }
            TaskCommands::Get { id } => output.print_value(&client.get_task(id).await?),
            TaskCommands::Stop { id } => output.print_value(&client.stop_task(id).await?),
            TaskCommands::Delete { id } => output.print_value(&client.delete_task(id).await?),
            TaskCommands::Stream { id } => follow(client, id).await,
        }
    }
}

/// Print one compact JSON event per line until the server closes the stream
/// or the user hits Ctrl-C
async fn follow(client: &RestClient, id: i64) -> anyhow::Result<()> {
    let mut events = client.stream_task_updates(id).await?;
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => {
                    writeln!(stdout, "{}", serde_json::to_string(&event?)?)?;
                    stdout.flush()?;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(task_id = id, "Interrupted; closing event stream");
                break;
            }
        }
    }

    events.close();
    Ok(())
}
