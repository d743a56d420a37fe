// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! REST API client for the BeRay task orchestration service
//!
//! The client authenticates a user, manages tasks (AI agent jobs), streams
//! their live events and exposes each task's file workspace.
//!
//! Every operation funnels its response through one normalizer
//! ([`response`]), so a non-2xx status always surfaces as
//! [`RestClientError::Api`] with a typed [`ApiErrorKind`]. Transport failures
//! surface as [`RestClientError::Http`].
//!
//! ```no_run
//! # async fn demo() -> beray_rest_client::RestClientResult<()> {
//! use beray_rest_client::{CreateTaskRequest, RestClient};
//! use futures::StreamExt;
//!
//! let client = RestClient::from_url("http://localhost:8000")?;
//! client.login("me@example.com", "secret").await?;
//!
//! let task = client.create_task(&CreateTaskRequest::new("summarize the repo")).await?;
//! let mut events = client.stream_task_updates(task.id).await?;
//! while let Some(event) = events.next().await {
//!     println!("{}", event?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod files;
pub mod response;
pub mod session;
pub mod sse;

pub use auth::{AuthState, Credential};
pub use client::RestClient;
pub use config::ClientConfig;
pub use error::*;
pub use files::{RawBody, guess_content_type};
pub use sse::{StreamDecodeWarning, TaskEventStream};

pub use beray_rest_api_contract::*;
