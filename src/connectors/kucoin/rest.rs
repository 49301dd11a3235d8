//! KuCoin Futures REST API Client
//!
//! Handles signing and sending HTTP requests to KuCoin Futures endpoints.

use reqwest::{header::HeaderMap, Client, Method};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::connectors::{
    auth::{timestamp_ms, ApiCredentials},
    error::ConnectorError,
};

/// Production KuCoin Futures API
pub const DEFAULT_BASE_URL: &str = "https://api-futures.kucoin.com";

/// Low-level KuCoin Futures REST client
#[derive(Clone)]
pub struct KucoinRestClient {
    client: Client,
    credentials: Option<ApiCredentials>,
    base_url: String,
}

impl KucoinRestClient {
    pub fn new(client: Client, credentials: Option<ApiCredentials>) -> Self {
        Self {
            client,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn build_auth_headers(&self, method: &Method, path: &str, body: &str) -> Result<HeaderMap, ConnectorError> {
        let creds = self.credentials.as_ref()
            .ok_or_else(|| ConnectorError::Authentication("KuCoin API credentials are not configured".to_string()))?;

        creds.sign(timestamp_ms(), method.as_str(), path, body)?.to_header_map()
    }

    /// Send one signed request. `path` includes the query string, since
    /// KuCoin signs it as part of the prehash.
    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ConnectorError> {
        let body = match body {
            Some(value) => serde_json::to_string(value)?,
            None => String::new(),
        };
        let headers = self.build_auth_headers(&method, path, &body)?;
        let url = format!("{}{}", self.base_url, path);

        debug!(method = %method, path, "KuCoin request");
        if !body.is_empty() {
            trace!(body = %body, "KuCoin request body");
        }

        let mut request = self.client.request(method, &url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, ConnectorError> {
        let status = response.status();
        debug!(status = status.as_u16(), "KuCoin response");

        if !status.is_success() {
            let body = response.text().await?;
            warn!(status = status.as_u16(), body = %body, "KuCoin API error");
            return Err(ConnectorError::Http { status: status.as_u16(), body });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ConnectorError::ParseError(format!(
                "Failed to parse response: {} - Body: {}",
                e,
                text.chars().take(200).collect::<String>()
            ))
        })
    }
}
