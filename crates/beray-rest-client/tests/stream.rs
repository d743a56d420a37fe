// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use beray_rest_client::TaskEvent;
use common::{reply, spawn_mock_server};
use futures::StreamExt;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

const SAMPLE_BODY: &str =
    "data: {\"a\":1}\n\ndata: not-json\n\n: comment-line\n\ndata:   {\"b\":2}   \n";

fn event_stream(body: Body) -> Response {
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn sample_router() -> Router {
    Router::new().route(
        "/api/v1/tasks/1/stream",
        get(|| async { event_stream(Body::from(SAMPLE_BODY)) }),
    )
}

/// Signals when the server drops the response body, i.e. the connection is gone
struct ReleaseGuard(Option<oneshot::Sender<()>>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

/// One event, then keep-alive comments until the client disconnects
fn endless_router(released: oneshot::Sender<()>) -> Router {
    let slot = Arc::new(Mutex::new(Some(released)));
    Router::new()
        .route(
            "/api/v1/tasks/2/stream",
            get(move || {
                let slot = slot.clone();
                async move {
                    let guard = ReleaseGuard(slot.lock().unwrap().take());
                    let chunks = futures::stream::unfold((guard, false), |(guard, started)| async move {
                        let chunk: &'static [u8] = if started {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            b": keep-alive\n\n"
                        } else {
                            b"data: {\"n\":1}\n\n"
                        };
                        Some((Ok::<_, Infallible>(Bytes::from_static(chunk)), (guard, true)))
                    });
                    event_stream(Body::from_stream(chunks))
                }
            }),
        )
        .route("/api/v1/tasks/", get(|| async { reply(200, json!([])) }))
}

#[tokio::test]
async fn sample_body_yields_two_events_in_order() {
    let server = spawn_mock_server(sample_router()).await;
    let client = server.client();
    client.set_credential("T").unwrap();

    let stream = client.stream_task_updates(1).await.unwrap();
    assert_eq!(stream.task_id(), 1);
    let events: Vec<TaskEvent> = stream.map(|item| item.unwrap()).collect().await;

    assert_eq!(events, vec![json!({"a": 1}), json!({"b": 2})]);

    let request = server.last_request("/api/v1/tasks/1/stream");
    assert_eq!(request.method, "GET");
    assert_eq!(request.header("accept"), Some("text/event-stream"));
    assert_eq!(request.header("authorization"), Some("Bearer T"));
}

#[tokio::test]
async fn malformed_payloads_reach_the_diagnostics_channel() {
    let server = spawn_mock_server(sample_router()).await;
    let (diag_tx, mut diag_rx) = mpsc::unbounded_channel();

    let mut stream = server
        .client()
        .stream_task_updates_with_diagnostics(1, diag_tx)
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event.unwrap());
    }
    assert_eq!(events.len(), 2);

    let warning = diag_rx.recv().await.expect("one warning");
    assert_eq!(warning.payload, "not-json");
    assert!(diag_rx.recv().await.is_none());
}

#[tokio::test]
async fn events_split_across_chunks_are_reassembled() {
    let router = Router::new().route(
        "/api/v1/tasks/1/stream",
        get(|| async {
            let parts = ["data: {\"step\"", ": 1}\n", "\ndata: {\"msg\": \"h\u{e9}", "llo\"}\r\n\r\n"];
            let chunks = futures::stream::iter(parts).then(|part| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, Infallible>(Bytes::from_static(part.as_bytes()))
            });
            event_stream(Body::from_stream(chunks))
        }),
    );
    let server = spawn_mock_server(router).await;

    let events: Vec<TaskEvent> = server
        .client()
        .stream_task_updates(1)
        .await
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(events, vec![json!({"step": 1}), json!({"msg": "h\u{e9}llo"})]);
}

#[tokio::test]
async fn dropping_the_stream_releases_the_connection() {
    let (released_tx, released_rx) = oneshot::channel();
    let server = spawn_mock_server(endless_router(released_tx)).await;

    let mut stream = server.client().stream_task_updates(2).await.unwrap();
    let first = timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("first event in time")
        .expect("stream open")
        .expect("no transport error");
    assert_eq!(first, json!({"n": 1}));

    drop(stream);

    timeout(Duration::from_secs(10), released_rx)
        .await
        .expect("server saw the connection close")
        .expect("guard signalled");
}

#[tokio::test]
async fn open_stream_does_not_block_other_requests() {
    let (released_tx, _released_rx) = oneshot::channel();
    let server = spawn_mock_server(endless_router(released_tx)).await;
    let client = server.client();

    let mut stream = client.stream_task_updates(2).await.unwrap();
    assert!(stream.next_event().await.unwrap().is_ok());

    let tasks = timeout(Duration::from_secs(5), client.list_tasks())
        .await
        .expect("list completes while streaming")
        .unwrap();
    assert!(tasks.is_empty());

    stream.close();
}

#[tokio::test]
async fn dropped_connection_ends_the_stream_with_a_transport_error() {
    let router = Router::new().route(
        "/api/v1/tasks/3/stream",
        get(|| async {
            let chunks = futures::stream::iter([0u8, 1]).then(|step| async move {
                if step == 0 {
                    Ok(Bytes::from_static(b"data: {\"n\":1}\n\n"))
                } else {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "upstream went away",
                    ))
                }
            });
            event_stream(Body::from_stream(chunks))
        }),
    );
    let server = spawn_mock_server(router).await;

    let stream = server.client().stream_task_updates(3).await.unwrap();
    let items: Vec<_> = timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .expect("stream ends after the disconnect");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &json!({"n": 1}));
    match &items[1] {
        Err(err) => assert!(err.is_transport(), "unexpected error: {err:?}"),
        Ok(event) => panic!("expected a transport error, got {event}"),
    }
}
