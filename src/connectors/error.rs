//! Connector Error Types
//!
//! Failures raised while talking to the exchange.

use thiserror::Error;

/// Errors that can occur when interacting with the exchange connector
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// Network-related errors (connection failed, DNS, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Request could not be signed, or no credentials are configured
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Exchange answered with a non-success HTTP status.
    ///
    /// The body is kept as raw text; KuCoin does not always answer with JSON.
    #[error("KuCoin API Error: {status} - {body}")]
    Http { status: u16, body: String },

    /// Response parsing failed
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ConnectorError::Timeout(err.to_string())
        } else if err.is_connect() {
            ConnectorError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ConnectorError::ParseError(err.to_string())
        } else {
            ConnectorError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_keeps_raw_body() {
        let err = ConnectorError::Http {
            status: 400,
            body: "<html>Bad Request</html>".to_string(),
        };
        assert_eq!(err.to_string(), "KuCoin API Error: 400 - <html>Bad Request</html>");
    }

    #[test]
    fn test_serde_error_maps_to_parse_error() {
        let err: ConnectorError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConnectorError::ParseError(_)));
    }
}
