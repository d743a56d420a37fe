// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use beray_rest_client::{ClientConfig, RestClient};
use serde_json::Value;
use tokio::task::JoinHandle;

/// One request as seen by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

type Recorder = Arc<Mutex<Vec<RecordedRequest>>>;

pub struct MockServer {
    pub base_url: String,
    recorder: Recorder,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Unauthenticated client pointed at this server
    pub fn client(&self) -> RestClient {
        RestClient::from_config(&ClientConfig::new(self.base_url.as_str())).expect("client")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorder.lock().unwrap().clone()
    }

    /// Last recorded request for `path`
    pub fn last_request(&self, path: &str) -> RecordedRequest {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.path == path)
            .unwrap_or_else(|| panic!("no request recorded for {}", path))
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `router` on an ephemeral port, recording every request it receives
pub async fn spawn_mock_server(router: Router) -> MockServer {
    let recorder = Recorder::default();
    let app = router.layer(middleware::from_fn_with_state(recorder.clone(), record));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("port");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    MockServer {
        base_url: format!("http://{}", addr),
        recorder,
        handle,
    }
}

async fn record(State(recorder): State<Recorder>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.expect("request body");

    recorder.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers.clone(),
        body: body.clone(),
    });

    next.run(Request::from_parts(parts, Body::from(body))).await
}

/// JSON response with an explicit status
pub fn reply(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).expect("valid status");
    (status, Json(body)).into_response()
}
