// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Response normalization
//!
//! Every operation funnels its response through this module: a 2xx status
//! becomes a parsed value, anything else becomes an [`ApiError`].

use beray_rest_api_contract::ErrorBody;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ApiError, RestClientError, RestClientResult};

/// Parse a JSON response into `T`, or map the failure status to an error.
///
/// A 204 response is treated as the empty object `{}`.
pub async fn handle_response<T: DeserializeOwned>(response: Response) -> RestClientResult<T> {
    let response = ensure_success(response).await?;

    if response.status() == StatusCode::NO_CONTENT {
        return Ok(serde_json::from_value(Value::Object(Map::new()))?);
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(RestClientError::from)
}

/// Pass a 2xx response through untouched so its body can be streamed;
/// consume and classify anything else.
pub async fn ensure_success(response: Response) -> RestClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let text = response.text().await?;
    let error = classify_failure(status, &text);
    debug!(%url, status = status.as_u16(), detail = error.detail(), "Request failed");
    Err(error.into())
}

/// Build the typed error for a non-2xx response body
pub fn classify_failure(status: StatusCode, body: &str) -> ApiError {
    ApiError::new(status, extract_detail(body))
}

/// The `detail` of a JSON error body, falling back to the raw text
pub fn extract_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.detail_text())
        .unwrap_or_else(|| body.to_string())
}
