// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server-Sent Events (SSE) streaming support
//!
//! The task stream endpoint pushes newline-delimited text. Only `data:` lines
//! carry events; each one holds a single JSON document. Blank lines separate
//! messages, and every other field (`event:`, `id:`, `:` comments) is ignored.
//!
//! Decoding is split in two layers:
//! - [`SseLineDecoder`] reassembles lines from arbitrary byte chunks and turns
//!   each `data:` line into an event or a [`StreamDecodeWarning`].
//! - [`TaskEventStream`] owns the connection. A background task pumps chunks
//!   through the decoder into a bounded queue that the consumer polls.
//!   Dropping the stream aborts the task, which drops the connection.

use beray_rest_api_contract::TaskEvent;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::Response;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, warn};

use crate::error::{RestClientError, RestClientResult};

/// Media type requested from the stream endpoint
pub const EVENT_STREAM_MEDIA_TYPE: &str = "text/event-stream";

/// The only field this client acts on. Matched case-sensitively.
pub const DATA_PREFIX: &str = "data:";

/// A `data:` payload that could not be decoded.
///
/// Never fatal: the line is skipped and the stream keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Could not decode JSON from SSE data: {payload} ({reason})")]
pub struct StreamDecodeWarning {
    pub payload: String,
    pub reason: String,
}

/// Outcome of decoding one line
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    Event(TaskEvent),
    Warning(StreamDecodeWarning),
}

/// Decode a single line (terminator already removed).
///
/// Returns `None` for lines that produce nothing: blank separators, non-data
/// fields, and `data:` lines whose payload is blank after trimming.
pub fn decode_line(line: &[u8]) -> Option<DecodedLine> {
    let rest = line.strip_prefix(DATA_PREFIX.as_bytes())?;

    let text = match std::str::from_utf8(rest) {
        Ok(text) => text,
        Err(err) => {
            return Some(DecodedLine::Warning(StreamDecodeWarning {
                payload: String::from_utf8_lossy(rest).trim().to_string(),
                reason: err.to_string(),
            }));
        }
    };

    let payload = text.trim();
    if payload.is_empty() {
        return None;
    }

    Some(match serde_json::from_str(payload) {
        Ok(event) => DecodedLine::Event(event),
        Err(err) => DecodedLine::Warning(StreamDecodeWarning {
            payload: payload.to_string(),
            reason: err.to_string(),
        }),
    })
}

/// Incremental line splitter for a chunked byte stream.
///
/// `\n`, `\r\n` and a bare `\r` each end a line. Bytes are buffered until a
/// terminator arrives, so lines and multi-byte UTF-8 sequences may straddle
/// chunk boundaries.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
    // Prefix of `buffer` already known to hold no terminator
    scanned: usize,
    // Last chunk ended on `\r`; a leading `\n` in the next one belongs to it
    skip_lf: bool,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and decode every line it completes, in order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DecodedLine> {
        let mut chunk = chunk;
        if self.skip_lf && !chunk.is_empty() {
            self.skip_lf = false;
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
        }
        self.buffer.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(pos) = self.buffer[from..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
        {
            let end = from + pos;
            if let Some(item) = decode_line(&self.buffer[start..end]) {
                decoded.push(item);
            }

            start = end + 1;
            if self.buffer[end] == b'\r' {
                match self.buffer.get(start) {
                    Some(b'\n') => start += 1,
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }
            from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        decoded
    }

    /// Decode whatever is left once the stream has ended
    pub fn finish(&mut self) -> Option<DecodedLine> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        self.skip_lf = false;
        decode_line(&rest)
    }

    /// Bytes held back waiting for a line terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Live events of one task.
///
/// Yields `Ok(event)` in arrival order until the server closes the
/// connection. A transport failure mid-stream is yielded once as
/// `Err(RestClientError::Http)` and then the stream ends.
pub struct TaskEventStream {
    task_id: i64,
    receiver: mpsc::Receiver<RestClientResult<TaskEvent>>,
    handle: JoinHandle<()>,
}

impl TaskEventStream {
    /// Start pumping an already validated streaming response
    pub(crate) fn spawn(
        task_id: i64,
        response: Response,
        buffer: usize,
        diagnostics: Option<mpsc::UnboundedSender<StreamDecodeWarning>>,
    ) -> Self {
        Self::from_chunks(task_id, response.bytes_stream(), buffer, diagnostics)
    }

    fn from_chunks<S>(
        task_id: i64,
        chunks: S,
        buffer: usize,
        diagnostics: Option<mpsc::UnboundedSender<StreamDecodeWarning>>,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        // Reader logs stay attached to the span that opened the stream
        let handle = tokio::spawn(
            pump(task_id, chunks, tx, diagnostics).instrument(tracing::Span::current()),
        );

        Self {
            task_id,
            receiver: rx,
            handle,
        }
    }

    pub fn task_id(&self) -> i64 {
        self.task_id
    }

    /// Wait for the next event; `None` once the stream has ended
    pub async fn next_event(&mut self) -> Option<RestClientResult<TaskEvent>> {
        self.receiver.recv().await
    }

    /// Stop consuming and release the connection
    pub fn close(self) {}
}

impl Drop for TaskEventStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl Stream for TaskEventStream {
    type Item = RestClientResult<TaskEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

async fn pump<S>(
    task_id: i64,
    chunks: S,
    tx: mpsc::Sender<RestClientResult<TaskEvent>>,
    diagnostics: Option<mpsc::UnboundedSender<StreamDecodeWarning>>,
) where
    S: Stream<Item = Result<Bytes, reqwest::Error>>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut decoder = SseLineDecoder::new();

    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(bytes) => {
                for item in decoder.feed(&bytes) {
                    if !deliver(task_id, item, &tx, diagnostics.as_ref()).await {
                        debug!(task_id, "Event stream consumer went away");
                        return;
                    }
                }
            }
            Err(err) => {
                warn!(task_id, "Event stream interrupted: {}", err);
                let _ = tx.send(Err(RestClientError::Http(err))).await;
                return;
            }
        }
    }

    if let Some(item) = decoder.finish() {
        deliver(task_id, item, &tx, diagnostics.as_ref()).await;
    }
    debug!(task_id, "Event stream closed by server");
}

/// Forward one decoded line; returns false when the consumer is gone
async fn deliver(
    task_id: i64,
    item: DecodedLine,
    tx: &mpsc::Sender<RestClientResult<TaskEvent>>,
    diagnostics: Option<&mpsc::UnboundedSender<StreamDecodeWarning>>,
) -> bool {
    match item {
        DecodedLine::Event(event) => tx.send(Ok(event)).await.is_ok(),
        DecodedLine::Warning(warning) => {
            warn!(task_id, "{}", warning);
            if let Some(diagnostics) = diagnostics {
                let _ = diagnostics.send(warning);
            }
            true
        }
    }
}
