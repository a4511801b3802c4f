//! Bearer-key authentication.

use std::collections::HashSet;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::{debug, warn};

use crate::limiter::credential_prefix;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer ...` header.
    Missing,
    /// A bearer token that is not on the allow list.
    Unknown,
}

impl AuthError {
    pub fn message(self) -> &'static str {
        match self {
            AuthError::Missing => "missing bearer credential",
            AuthError::Unknown => "invalid or unauthorized API key",
        }
    }
}

/// Allow list of client API keys.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    keys: HashSet<String>,
}

impl ApiKeys {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Return the caller's key if the request carries an allowed bearer token.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::Missing)?;
        if !self.keys.contains(token) {
            warn!(credential = credential_prefix(token), "rejected unknown API key");
            return Err(AuthError::Unknown);
        }
        debug!(credential = credential_prefix(token), "API key accepted");
        Ok(token.to_string())
    }
}

/// Extract the token from `Authorization: Bearer <token>`. The scheme is
/// case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
