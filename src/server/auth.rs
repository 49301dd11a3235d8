//! Shared-key authentication for inbound MCP requests.

use axum::http::HeaderMap;
use std::fmt;
use thiserror::Error;

pub const AUTH_KEY_HEADER: &str = "x-mcp-auth-key";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication required. Provide X-MCP-Auth-Key header or Authorization: Bearer <key>")]
    Missing,

    #[error("Invalid authentication key")]
    Invalid,
}

/// Accepts a request when it presents one of the configured keys.
/// With no keys configured every request is accepted.
#[derive(Clone, Default)]
pub struct AuthGate {
    keys: Vec<String>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate").field("keys", &self.keys.len()).finish()
    }
}

impl AuthGate {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn is_open(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        if self.is_open() {
            return Ok(());
        }

        let presented = presented_key(headers).ok_or(AuthError::Missing)?;
        if self.keys.iter().any(|key| key == presented) {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }
}

/// `X-MCP-Auth-Key` wins over `Authorization: Bearer <key>`.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, AUTH_KEY_HEADER).or_else(|| {
        header_str(headers, "authorization")
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
            .filter(|v| !v.is_empty())
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).filter(|v| !v.is_empty())
}
