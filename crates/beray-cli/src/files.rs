// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Task workspace commands

use anyhow::Context;
use beray_rest_client::{RawBody, RestClient};
use clap::Subcommand;
use std::path::PathBuf;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::output::Output;

#[derive(Subcommand, Debug)]
pub enum FilesCommands {
    /// List a directory of the task workspace
    Tree {
        task_id: i64,
        /// Directory to list (default: workspace root)
        #[arg(long)]
        path: Option<String>,
    },
    /// Write a workspace file to stdout
    Cat { task_id: i64, path: String },
    /// Upload a local file into the workspace
    Put {
        task_id: i64,
        /// Destination path inside the workspace
        path: String,
        /// Local file to upload
        local_file: PathBuf,
        /// Override the type guessed from the destination extension
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Download workspace files as a ZIP archive
    Download {
        task_id: i64,
        /// Path to include (repeatable); the whole workspace when omitted
        #[arg(long)]
        path: Vec<String>,
        /// Where to write the archive
        #[arg(long, short)]
        output: PathBuf,
    },
}

impl FilesCommands {
    pub async fn run(self, client: &RestClient, output: &Output) -> anyhow::Result<()> {
        match self {
            FilesCommands::Tree { task_id, path } => {
                let entries = client.list_files_tree(task_id, path.as_deref()).await?;
                output.print_list(&entries)
            }
            FilesCommands::Cat { task_id, path } => {
                let body = client.get_file_content(task_id, &path).await?;
                let mut stdout = tokio::io::stdout();
                copy_body(body, &mut stdout).await?;
                Ok(())
            }
            FilesCommands::Put {
                task_id,
                path,
                local_file,
                content_type,
            } => {
                let content = tokio::fs::read(&local_file)
                    .await
                    .with_context(|| format!("Failed to read {}", local_file.display()))?;
                let ack = client
                    .upload_file(task_id, &path, content, content_type.as_deref())
                    .await?;
                output.print_value(&ack)
            }
            FilesCommands::Download {
                task_id,
                path,
                output: archive,
            } => {
                let body = client.download_files_as_zip(task_id, Some(path.as_slice())).await?;
                let mut file = tokio::fs::File::create(&archive)
                    .await
                    .with_context(|| format!("Failed to create {}", archive.display()))?;
                let written = copy_body(body, &mut file).await?;
                tracing::info!(bytes = written, path = %archive.display(), "Archive saved");
                Ok(())
            }
        }
    }
}

/// Stream a raw body into `sink` chunk by chunk; returns the byte count
async fn copy_body<W>(mut body: RawBody, sink: &mut W) -> anyhow::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = body.chunk().await? {
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    sink.flush().await?;
    Ok(written)
}
