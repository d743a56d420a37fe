// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Bearer credential handling

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::RestClientResult;

/// Bearer token for an authenticated session
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    header: HeaderValue,
}

impl Credential {
    /// Build a credential, rejecting tokens that cannot travel in a header
    pub fn bearer(token: impl Into<String>) -> RestClientResult<Self> {
        let token = token.into();
        let mut header = HeaderValue::from_str(&format!("Bearer {}", token))?;
        header.set_sensitive(true);
        Ok(Self { token, header })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.header
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("token", &"<redacted>").finish()
    }
}

/// The credential slot shared by every clone of a client.
///
/// At most one credential is active. Writers take the lock exclusively, so a
/// request observes either the old or the new credential, never a mix.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    current: Arc<RwLock<Option<Credential>>>,
}

impl AuthState {
    pub fn new(credential: Option<Credential>) -> Self {
        Self {
            current: Arc::new(RwLock::new(credential)),
        }
    }

    /// Install `credential`, replacing any previous one
    pub fn set(&self, credential: Credential) {
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(credential);
    }

    /// Drop the active credential; returns whether one was set
    pub fn clear(&self) -> bool {
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        slot.take().is_some()
    }

    pub fn current(&self) -> Option<Credential> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Headers to attach to the next outgoing request
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(credential) = self.current() {
            headers.insert(AUTHORIZATION, credential.header_value().clone());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RestClientError;

    #[test]
    fn headers_follow_the_active_credential() {
        let auth = AuthState::default();
        assert!(auth.headers().get(AUTHORIZATION).is_none());

        auth.set(Credential::bearer("first").unwrap());
        assert_eq!(auth.headers()[AUTHORIZATION], "Bearer first");

        auth.set(Credential::bearer("second").unwrap());
        assert_eq!(auth.headers()[AUTHORIZATION], "Bearer second");

        assert!(auth.clear());
        assert!(auth.headers().get(AUTHORIZATION).is_none());
        assert!(!auth.clear());
    }

    #[test]
    fn clones_share_the_slot() {
        let auth = AuthState::default();
        let other = auth.clone();

        auth.set(Credential::bearer("shared").unwrap());
        assert!(other.is_authenticated());
        assert_eq!(other.current().unwrap().token(), "shared");

        other.clear();
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn debug_output_redacts_token() {
        let credential = Credential::bearer("super-secret").unwrap();
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn rejects_tokens_with_control_characters() {
        let err = Credential::bearer("bad\ntoken").unwrap_err();
        assert!(matches!(err, RestClientError::InvalidHeader(_)));
    }
}
