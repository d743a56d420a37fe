// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Task workspace operations
//!
//! File content and ZIP downloads hand back the open response as a
//! [`RawBody`]. Failure statuses are normalized before that happens; a
//! successful body is never buffered implicitly.

use beray_rest_api_contract::{DownloadRequest, UploadResponse, WorkspaceEntry};
use bytes::Bytes;
use futures::stream::{Stream, TryStreamExt};
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Body, Method, Response, StatusCode};
use std::path::Path;

use crate::client::RestClient;
use crate::error::{RestClientError, RestClientResult};
use crate::response::{ensure_success, handle_response};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Path used by [`RestClient::list_files_tree`] when none is given
pub const WORKSPACE_ROOT: &str = ".";

/// Guess a media type from the extension of `path`
pub fn guess_content_type(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
        .as_str()
    {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" | "mjs" => "text/javascript",
        "py" => "text/x-python",
        "xml" => "application/xml",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "sh" => "application/x-sh",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// An open, successful response whose body has not been read yet
#[derive(Debug)]
pub struct RawBody {
    response: Response,
}

impl RawBody {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Next chunk of the body; `None` at the end
    pub async fn chunk(&mut self) -> RestClientResult<Option<Bytes>> {
        Ok(self.response.chunk().await?)
    }

    /// Read the remaining body into memory
    pub async fn bytes(self) -> RestClientResult<Bytes> {
        Ok(self.response.bytes().await?)
    }

    pub fn into_stream(self) -> impl Stream<Item = RestClientResult<Bytes>> {
        self.response.bytes_stream().map_err(RestClientError::from)
    }
}

impl RestClient {
    /// Entries under `path` in the task workspace (the root when `None`)
    pub async fn list_files_tree(
        &self,
        task_id: i64,
        path: Option<&str>,
    ) -> RestClientResult<Vec<WorkspaceEntry>> {
        let request = self
            .session
            .request(Method::GET, &format!("/tasks/{}/files/tree", task_id))
            .query(&[("path", path.unwrap_or(WORKSPACE_ROOT))]);
        handle_response(self.session.send(request).await?).await
    }

    /// Open a workspace file for reading
    pub async fn get_file_content(&self, task_id: i64, path: &str) -> RestClientResult<RawBody> {
        let request = self
            .session
            .stream_request(Method::GET, &format!("/tasks/{}/files/content", task_id))
            .query(&[("path", path)]);
        let response = ensure_success(self.session.send(request).await?).await?;
        Ok(RawBody { response })
    }

    /// Write `content` to `path`, creating or replacing the file.
    ///
    /// Without an explicit `content_type` the type is guessed from the path.
    pub async fn upload_file(
        &self,
        task_id: i64,
        path: &str,
        content: impl Into<Body>,
        content_type: Option<&str>,
    ) -> RestClientResult<UploadResponse> {
        let content_type = content_type.unwrap_or_else(|| guess_content_type(path));
        let request = self
            .session
            .request(Method::PUT, &format!("/tasks/{}/files/content", task_id))
            .query(&[("path", path)])
            .header(CONTENT_TYPE, content_type)
            .body(content);
        handle_response(self.session.send(request).await?).await
    }

    /// Download `paths` as one ZIP archive; `None` or an empty list selects
    /// the whole workspace
    pub async fn download_files_as_zip(
        &self,
        task_id: i64,
        paths: Option<&[String]>,
    ) -> RestClientResult<RawBody> {
        let body = DownloadRequest {
            paths: paths.map(<[String]>::to_vec).unwrap_or_default(),
        };
        let request = self
            .session
            .stream_request(Method::POST, &format!("/tasks/{}/files/download", task_id))
            .json(&body);
        let response = ensure_success(self.session.send(request).await?).await?;
        Ok(RawBody { response })
    }
}
