// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Account and session commands
//!
//! Nothing is persisted: `login` prints the token so it can be exported as
//! `BERAY_TOKEN` for later invocations.

use beray_rest_client::RestClient;
use clap::Subcommand;

use crate::output::Output;

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Email a registration code
    RequestCode {
        #[arg(long)]
        email: String,
    },
    /// Create an account with a code from `request-code`
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
        #[arg(long, env = "BERAY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Obtain a bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BERAY_PASSWORD", hide_env_values = true)]
        password: String,
        /// Use the OAuth2 password form endpoint
        #[arg(long)]
        form: bool,
    },
    /// Invalidate the current token
    Logout,
    /// Show the authenticated user
    Whoami,
}

impl AuthCommands {
    pub async fn run(self, client: &RestClient, output: &Output) -> anyhow::Result<()> {
        match self {
            AuthCommands::RequestCode { email } => {
                output.print_value(&client.request_verification_code(&email).await?)
            }
            AuthCommands::Register {
                email,
                code,
                password,
            } => output.print_value(&client.register(&email, &code, &password).await?),
            AuthCommands::Login {
                email,
                password,
                form,
            } => {
                let response = if form {
                    client.login_with_form(&email, &password).await?
                } else {
                    client.login(&email, &password).await?
                };
                if response.access_token.is_none() {
                    tracing::warn!("Login succeeded but no access token was returned");
                }
                output.print_value(&response)
            }
            AuthCommands::Logout => {
                if !client.is_authenticated() {
                    anyhow::bail!("No token to log out; pass --token or set BERAY_TOKEN");
                }
                output.print_value(&client.logout().await?)
            }
            AuthCommands::Whoami => output.print_value(&client.get_current_user().await?),
        }
    }
}
