// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main REST API client implementation

use beray_rest_api_contract::*;
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::RestClientResult;
use crate::response::{ensure_success, handle_response};
use crate::session::HttpSession;
use crate::sse::{EVENT_STREAM_MEDIA_TYPE, StreamDecodeWarning, TaskEventStream};

/// REST API client for the BeRay service
///
/// Clones share the HTTP connection pool and the credential slot, so a login
/// through one clone authenticates all of them.
#[derive(Debug, Clone)]
pub struct RestClient {
    pub(crate) session: HttpSession,
    event_buffer: usize,
}

impl RestClient {
    /// Create a client from a full configuration
    pub fn from_config(config: &ClientConfig) -> RestClientResult<Self> {
        Ok(Self {
            session: HttpSession::from_config(config)?,
            event_buffer: config.event_buffer,
        })
    }

    /// Create an unauthenticated client for a service root such as
    /// `http://localhost:8000`
    pub fn from_url(base_url: &str) -> RestClientResult<Self> {
        Self::from_config(&ClientConfig::new(base_url))
    }

    /// Get the service root
    pub fn base_url(&self) -> &Url {
        self.session.base_url()
    }

    /// Attach a bearer token to all future requests
    pub fn set_credential(&self, token: &str) -> RestClientResult<()> {
        self.session.set_credential(token)
    }

    pub fn clear_credential(&self) {
        self.session.clear_credential()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.auth().is_authenticated()
    }

    /// Ask the service to email a registration code
    pub async fn request_verification_code(&self, email: &str) -> RestClientResult<MessageResponse> {
        let body = VerificationCodeRequest {
            email: email.to_string(),
        };
        self.post("/auth/request-verification-code", &body).await
    }

    /// Register a new account; the returned token is installed
    pub async fn register(
        &self,
        email: &str,
        verification_code: &str,
        password: &str,
    ) -> RestClientResult<AuthResponse> {
        let body = RegisterRequest {
            email: email.to_string(),
            verification_code: verification_code.to_string(),
            password: password.to_string(),
        };
        let response = self.post("/auth/register", &body).await?;
        self.install_credential(response)
    }

    /// Log in with a JSON body; the returned token is installed
    pub async fn login(&self, email: &str, password: &str) -> RestClientResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.post("/auth/login", &body).await?;
        self.install_credential(response)
    }

    /// Log in through the OAuth2 password form; the returned token is installed
    pub async fn login_with_form(
        &self,
        email: &str,
        password: &str,
    ) -> RestClientResult<AuthResponse> {
        let form = TokenForm {
            username: email.to_string(),
            password: password.to_string(),
        };
        let request = self.session.request(Method::POST, "/auth/token").form(&form);
        let response = handle_response(self.session.send(request).await?).await?;
        self.install_credential(response)
    }

    /// End the session.
    ///
    /// The local credential is dropped as soon as the request has been issued,
    /// whatever the service answers.
    pub async fn logout(&self) -> RestClientResult<MessageResponse> {
        let request = self.session.request(Method::POST, "/auth/logout");
        let sent = self.session.send(request).await;
        self.session.clear_credential();
        handle_response(sent?).await
    }

    /// Profile of the authenticated user
    pub async fn get_current_user(&self) -> RestClientResult<User> {
        self.get("/users/me").await
    }

    /// Create a task
    pub async fn create_task(&self, request: &CreateTaskRequest) -> RestClientResult<Task> {
        self.post("/tasks/", request).await
    }

    /// List the caller's tasks in server order
    pub async fn list_tasks(&self) -> RestClientResult<Vec<Task>> {
        self.get("/tasks/").await
    }

    pub async fn get_task(&self, task_id: i64) -> RestClientResult<Task> {
        self.get(&format!("/tasks/{}", task_id)).await
    }

    pub async fn stop_task(&self, task_id: i64) -> RestClientResult<MessageResponse> {
        let request = self.session.request(Method::POST, &format!("/tasks/{}/stop", task_id));
        handle_response(self.session.send(request).await?).await
    }

    pub async fn delete_task(&self, task_id: i64) -> RestClientResult<MessageResponse> {
        self.delete(&format!("/tasks/{}", task_id)).await
    }

    /// Open the live event stream of a task.
    ///
    /// Fails with the normalized API error if the stream endpoint does not
    /// answer 2xx. Malformed events are skipped and logged.
    pub async fn stream_task_updates(&self, task_id: i64) -> RestClientResult<TaskEventStream> {
        self.open_task_stream(task_id, None).await
    }

    /// Like [`stream_task_updates`](Self::stream_task_updates), additionally
    /// forwarding every skipped payload to `diagnostics`
    pub async fn stream_task_updates_with_diagnostics(
        &self,
        task_id: i64,
        diagnostics: mpsc::UnboundedSender<StreamDecodeWarning>,
    ) -> RestClientResult<TaskEventStream> {
        self.open_task_stream(task_id, Some(diagnostics)).await
    }

    async fn open_task_stream(
        &self,
        task_id: i64,
        diagnostics: Option<mpsc::UnboundedSender<StreamDecodeWarning>>,
    ) -> RestClientResult<TaskEventStream> {
        let request = self
            .session
            .stream_request(Method::GET, &format!("/tasks/{}/stream", task_id))
            .header(ACCEPT, EVENT_STREAM_MEDIA_TYPE);
        let response = ensure_success(self.session.send(request).await?).await?;

        debug!(task_id, "Event stream connected");
        Ok(TaskEventStream::spawn(
            task_id,
            response,
            self.event_buffer,
            diagnostics,
        ))
    }

    fn install_credential(&self, response: AuthResponse) -> RestClientResult<AuthResponse> {
        if let Some(token) = response.access_token.as_deref() {
            self.session.set_credential(token)?;
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        let request = self.session.request(Method::GET, path);
        handle_response(self.session.send(request).await?).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> RestClientResult<T> {
        let request = self.session.request(Method::POST, path).json(body);
        handle_response(self.session.send(request).await?).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        let request = self.session.request(Method::DELETE, path);
        handle_response(self.session.send(request).await?).await
    }
}
