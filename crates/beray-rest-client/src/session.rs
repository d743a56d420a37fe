// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! HTTP transport session
//!
//! Holds the API root and the active bearer credential, and issues raw
//! requests. Nothing here looks at response status or bodies; that is the job
//! of [`crate::response`].

use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::auth::{AuthState, Credential};
use crate::config::ClientConfig;
use crate::error::RestClientResult;

const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct HttpSession {
    http_client: HttpClient,
    base_url: Url,
    api_root: String,
    auth: AuthState,
    request_timeout: Option<Duration>,
}

impl HttpSession {
    pub fn from_config(config: &ClientConfig) -> RestClientResult<Self> {
        let base_url = Url::parse(&config.service_base_url)?;
        let http_client = HttpClient::builder().user_agent(config.user_agent.as_str()).build()?;

        let auth = AuthState::default();
        if let Some(token) = &config.token {
            auth.set(Credential::bearer(token.as_str())?);
        }

        Ok(Self {
            api_root: api_root(config.service_base_url.as_str()),
            http_client,
            base_url,
            auth,
            request_timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Full URL for an API path such as `/tasks/1`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    /// Attach `Authorization: Bearer <token>` to every future request
    pub fn set_credential(&self, token: &str) -> RestClientResult<()> {
        self.auth.set(Credential::bearer(token)?);
        info!("Bearer credential installed");
        Ok(())
    }

    pub fn clear_credential(&self) {
        if self.auth.clear() {
            info!("Bearer credential cleared");
        }
    }

    /// Start a request carrying the current credential and the configured timeout
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.stream_request(method, path);
        match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Like [`request`](Self::request) but without a timeout, for long-lived bodies
    pub fn stream_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!(%method, %url, "Issuing request");
        self.http_client.request(method, url).headers(self.auth.headers())
    }

    pub async fn send(&self, request: RequestBuilder) -> RestClientResult<Response> {
        Ok(request.send().await?)
    }
}

/// `<root>/api/v1` with any trailing slashes of `root` removed
fn api_root(root: &str) -> String {
    format!("{}{}", root.trim_end_matches('/'), API_PREFIX)
}
