// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_EVENT_BUFFER: usize = 32;

pub const ENV_BASE_URL: &str = "BERAY_BASE_URL";
pub const ENV_TOKEN: &str = "BERAY_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "BERAY_TIMEOUT_SECS";

/// Connection settings for [`RestClient`](crate::RestClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Service root; `/api/v1` is appended to it
    pub service_base_url: String,
    /// Initial bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user_agent: String,
    /// Per-request timeout for plain requests. Event streams are never timed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Number of decoded events buffered ahead of the consumer
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            user_agent: concat!("beray-client/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ClientConfig {
    pub fn new(service_base_url: impl Into<String>) -> Self {
        Self {
            service_base_url: service_base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Defaults overlaid with `BERAY_BASE_URL`, `BERAY_TOKEN` and `BERAY_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            config.service_base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            config.token = Some(token);
        }
        match lookup(ENV_TIMEOUT_SECS).map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) => config.request_timeout_secs = Some(secs),
            Some(Err(err)) => {
                tracing::warn!("Ignoring invalid {}: {}", ENV_TIMEOUT_SECS, err);
            }
            None => {}
        }
        config
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
