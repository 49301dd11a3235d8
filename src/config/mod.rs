//! Runtime configuration
//!
//! Everything is read from the process environment (optionally seeded from a
//! `.env` file by the binary) once at startup.
//!
//! # Environment Variables
//! - `KUCOIN_API_KEY`, `KUCOIN_API_SECRET`, `KUCOIN_API_PASSPHRASE`: exchange credentials
//! - `KUCOIN_FUTURES_BASE_URL`: exchange base URL override
//! - `KUCOIN_HTTP_TIMEOUT_SECS`: outbound request timeout (default 30)
//! - `MCP_AUTH_KEY`, `MCP_AUTH_KEYS`: keys accepted by the auth gate

pub mod logging;

pub use logging::init_logging;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::connectors::{kucoin::DEFAULT_BASE_URL, ApiCredentials};

pub const ENV_API_KEY: &str = "KUCOIN_API_KEY";
pub const ENV_API_SECRET: &str = "KUCOIN_API_SECRET";
pub const ENV_API_PASSPHRASE: &str = "KUCOIN_API_PASSPHRASE";
pub const ENV_BASE_URL: &str = "KUCOIN_FUTURES_BASE_URL";
pub const ENV_HTTP_TIMEOUT: &str = "KUCOIN_HTTP_TIMEOUT_SECS";
pub const ENV_AUTH_KEY: &str = "MCP_AUTH_KEY";
pub const ENV_AUTH_KEYS: &str = "MCP_AUTH_KEYS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Incomplete KuCoin credentials: {0} must be set together with the other KUCOIN_API_* variables")]
    PartialCredentials(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub credentials: Option<ApiCredentials>,
    pub base_url: String,
    pub http_timeout: Duration,
    pub auth_keys: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("http_timeout", &self.http_timeout)
            .field("auth_keys", &format!("<{} keys>", self.auth_keys.len()))
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credentials = match (get(ENV_API_KEY), get(ENV_API_SECRET), get(ENV_API_PASSPHRASE)) {
            (Some(key), Some(secret), Some(passphrase)) => Some(ApiCredentials::new(&key, &secret, &passphrase)),
            (None, None, None) => None,
            (None, _, _) => return Err(ConfigError::PartialCredentials(ENV_API_KEY)),
            (_, None, _) => return Err(ConfigError::PartialCredentials(ENV_API_SECRET)),
            (_, _, None) => return Err(ConfigError::PartialCredentials(ENV_API_PASSPHRASE)),
        };

        let http_timeout = match get(ENV_HTTP_TIMEOUT) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidValue { name: ENV_HTTP_TIMEOUT, value: raw }),
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            credentials,
            base_url: get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http_timeout,
            auth_keys: parse_auth_keys(get(ENV_AUTH_KEY).as_deref(), get(ENV_AUTH_KEYS).as_deref()),
        })
    }
}

/// The single key first, then the comma-separated list. Blank entries are dropped.
pub fn parse_auth_keys(single: Option<&str>, list: Option<&str>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let candidates = single
        .into_iter()
        .chain(list.into_iter().flat_map(|l| l.split(',')))
        .map(str::trim)
        .filter(|k| !k.is_empty());

    for key in candidates {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}
