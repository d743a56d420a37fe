// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use beray_logging::CliLoggingArgs;
use beray_rest_client::config::{DEFAULT_BASE_URL, ENV_BASE_URL, ENV_TIMEOUT_SECS, ENV_TOKEN};
use beray_rest_client::{ClientConfig, RestClient};
use clap::{Args, Subcommand};

pub mod auth;
pub mod files;
pub mod output;
pub mod task;

use output::Output;

#[derive(clap::Parser)]
#[command(
    name = "beray",
    about = "BeRay task orchestration CLI",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[command(flatten)]
    pub logging: CliLoggingArgs,
    /// Print list results as one JSON object per line
    #[arg(long, global = true)]
    pub json_lines: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Account and session commands
    Auth {
        #[command(subcommand)]
        subcommand: auth::AuthCommands,
    },
    /// Create, inspect and follow tasks
    Task {
        #[command(subcommand)]
        subcommand: task::TaskCommands,
    },
    /// Browse and transfer task workspace files
    Files {
        #[command(subcommand)]
        subcommand: files::FilesCommands,
    },
}

/// Where the service lives and how to authenticate against it
#[derive(Args, Clone, Debug)]
pub struct ConnectionArgs {
    /// Service root; `/api/v1` is appended
    #[arg(long, global = true, env = ENV_BASE_URL, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Bearer token from a previous `auth login`
    #[arg(long, global = true, env = ENV_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Timeout for plain requests, in seconds (streams are never timed out)
    #[arg(long, global = true, env = ENV_TIMEOUT_SECS)]
    pub timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.base_url.as_str());
        config.token = self.token.clone().filter(|t| !t.is_empty());
        config.request_timeout_secs = self.timeout_secs;
        config
    }

    pub fn client(&self) -> anyhow::Result<RestClient> {
        Ok(RestClient::from_config(&self.client_config())?)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let client = self.connection.client()?;
        let output = Output::new(self.json_lines);

        match self.command {
            Commands::Auth { subcommand } => subcommand.run(&client, &output).await,
            Commands::Task { subcommand } => subcommand.run(&client, &output).await,
            Commands::Files { subcommand } => subcommand.run(&client, &output).await,
        }
    }
}

pub use clap::Parser;
