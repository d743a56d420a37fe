// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for API contract parsing

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while parsing API contract values
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("Invalid task status: {0:?}")]
    InvalidTaskStatus(String),
}

/// Error body returned by the service for non-2xx responses
///
/// The service usually sends a string, but validation failures (422) carry a
/// structured list, so `detail` stays an untyped JSON value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Create an error body with a plain string detail
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(serde_json::Value::String(detail.into())),
        }
    }

    /// Human readable rendering of `detail`
    ///
    /// Strings are returned verbatim; any other JSON value is rendered as
    /// compact JSON text. Returns `None` when the field is absent or null.
    pub fn detail_text(&self) -> Option<String> {
        match &self.detail {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}
