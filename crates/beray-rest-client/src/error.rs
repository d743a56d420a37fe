// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the REST client

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Result alias used by every client operation
pub type RestClientResult<T> = Result<T, RestClientError>;

/// Classification of a non-2xx response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 401
    AuthenticationFailed,
    /// 403
    AuthenticationForbidden,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 422
    UnprocessableEntity,
    /// Any other non-2xx status
    Generic,
}

impl ApiErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiErrorKind::AuthenticationFailed,
            StatusCode::FORBIDDEN => ApiErrorKind::AuthenticationForbidden,
            StatusCode::NOT_FOUND => ApiErrorKind::NotFound,
            StatusCode::CONFLICT => ApiErrorKind::Conflict,
            StatusCode::UNPROCESSABLE_ENTITY => ApiErrorKind::UnprocessableEntity,
            _ => ApiErrorKind::Generic,
        }
    }
}

/// A failed request as reported by the service
///
/// `detail` is the `detail` field of the JSON error body, or the raw body text
/// when the body is not JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ApiErrorKind,
    status: u16,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// True for 401 and 403, where the caller should re-authenticate
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::AuthenticationFailed | ApiErrorKind::AuthenticationForbidden
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ApiErrorKind::AuthenticationFailed => {
                write!(f, "Authentication failed: {}", self.detail)
            }
            ApiErrorKind::AuthenticationForbidden => write!(f, "Forbidden: {}", self.detail),
            _ => write!(
                f,
                "API request failed with status {}: {}",
                self.status, self.detail
            ),
        }
    }
}

impl std::error::Error for ApiError {}

/// REST client error types
#[derive(Debug, Error)]
pub enum RestClientError {
    /// The service answered with a non-2xx status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Connection, DNS, TLS or mid-stream transport failure
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// A 2xx body did not match the expected schema
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl RestClientError {
    /// The API error, if the failure came from a non-2xx response
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            RestClientError::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ApiErrorKind> {
        self.api_error().map(ApiError::kind)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RestClientError::Api(err) => Some(err.status()),
            RestClientError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the request never produced an HTTP response
    pub fn is_transport(&self) -> bool {
        matches!(self, RestClientError::Http(_))
    }
}
