//! Authentication Utilities for the KuCoin Futures connector
//!
//! KuCoin API v2 signs every private request with two HMAC-SHA256 digests
//! keyed by the API secret: one over the request prehash, one over the
//! passphrase. Both are base64 encoded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use sha2::Sha256;

use crate::connectors::error::ConnectorError;

pub const HEADER_API_KEY: &str = "KC-API-KEY";
pub const HEADER_SIGN: &str = "KC-API-SIGN";
pub const HEADER_TIMESTAMP: &str = "KC-API-TIMESTAMP";
pub const HEADER_PASSPHRASE: &str = "KC-API-PASSPHRASE";
pub const HEADER_KEY_VERSION: &str = "KC-API-KEY-VERSION";

/// Key version announced to KuCoin. Version 2 expects an HMAC'd passphrase.
pub const KEY_VERSION: &str = "2";

/// API credentials for exchange authentication
#[derive(Clone)]
pub struct ApiCredentials {
    /// API key (public identifier)
    pub api_key: String,
    /// API secret (for signing requests)
    pub api_secret: String,
    /// Passphrase chosen when the key was created
    pub passphrase: String,
}

impl ApiCredentials {
    pub fn new(api_key: &str, api_secret: &str, passphrase: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            passphrase: passphrase.to_string(),
        }
    }

    /// Sign one request. `timestamp` must be fresh for every call.
    pub fn sign(
        &self,
        timestamp: u64,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<SignedHeaders, ConnectorError> {
        let timestamp = timestamp.to_string();
        let prehash = format!("{}{}{}{}", timestamp, method.to_uppercase(), path, body);

        Ok(SignedHeaders {
            api_key: self.api_key.clone(),
            signature: hmac_sha256_sign_base64(&self.api_secret, &prehash)?,
            encrypted_passphrase: hmac_sha256_sign_base64(&self.api_secret, &self.passphrase)?,
            timestamp,
        })
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &format!("{}...", &self.api_key.chars().take(8).collect::<String>()))
            .field("api_secret", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

/// Authentication headers for a single outbound request
#[derive(Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub api_key: String,
    pub signature: String,
    pub timestamp: String,
    pub encrypted_passphrase: String,
}

impl SignedHeaders {
    /// Convert into a header map ready to attach to a reqwest request.
    ///
    /// A value that cannot be carried in an HTTP header fails the call instead
    /// of being dropped.
    pub fn to_header_map(&self) -> Result<HeaderMap, ConnectorError> {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_API_KEY, header_value(HEADER_API_KEY, &self.api_key)?);
        headers.insert(HEADER_SIGN, header_value(HEADER_SIGN, &self.signature)?);
        headers.insert(HEADER_TIMESTAMP, header_value(HEADER_TIMESTAMP, &self.timestamp)?);
        headers.insert(
            HEADER_PASSPHRASE,
            header_value(HEADER_PASSPHRASE, &self.encrypted_passphrase)?,
        );
        headers.insert(HEADER_KEY_VERSION, HeaderValue::from_static(KEY_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl std::fmt::Debug for SignedHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedHeaders")
            .field("timestamp", &self.timestamp)
            .field("signature", &"[REDACTED]")
            .field("encrypted_passphrase", &"[REDACTED]")
            .finish()
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ConnectorError> {
    HeaderValue::from_str(value)
        .map_err(|_| ConnectorError::Authentication(format!("{} is not a valid header value", name)))
}

/// Sign a message using HMAC-SHA256 and return base64
pub fn hmac_sha256_sign_base64(secret: &str, message: &str) -> Result<String, ConnectorError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| ConnectorError::Authentication(format!("Invalid API secret: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Generate a timestamp in milliseconds
pub fn timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Build a query string from key-value pairs, percent-encoding the values
pub fn build_query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, url_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a query value or path segment
pub fn url_encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
