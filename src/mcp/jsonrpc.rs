//! JSON-RPC 2.0 envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mcp::error::DispatchError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound request. `id` defaults to null and is echoed back verbatim.
/// The `jsonrpc` member is not checked.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn parse(body: &[u8]) -> Result<Self, DispatchError> {
        serde_json::from_slice(body).map_err(|_| DispatchError::Parse)
    }

    pub fn is_notification(&self) -> bool {
        self.method.starts_with("notifications/")
    }

    /// Look up a field of `params`, if both exist
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get(key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, err: &DispatchError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: err.code(),
                message: err.to_string(),
            }),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_defaults_id_to_null() {
        let req = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert_eq!(req.id, Value::Null);
        assert_eq!(req.method, "ping");
        assert!(req.params.is_none());
    }

    #[test]
    fn test_parse_keeps_string_id() {
        let req = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":"abc","method":"tools/list"}"#).unwrap();
        assert_eq!(req.id, json!("abc"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(JsonRpcRequest::parse(b"{oops"), Err(DispatchError::Parse)));
        assert!(matches!(JsonRpcRequest::parse(br#"{"id":1}"#), Err(DispatchError::Parse)));
        assert!(matches!(JsonRpcRequest::parse(b"[1,2]"), Err(DispatchError::Parse)));
    }

    #[test]
    fn test_null_id_is_serialized() {
        let resp = JsonRpcResponse::success(Value::Null, json!("pong"));
        assert_eq!(resp.to_value(), json!({"jsonrpc": "2.0", "id": null, "result": "pong"}));
    }

    #[test]
    fn test_failure_shape() {
        let resp = JsonRpcResponse::failure(json!(7), &DispatchError::MethodNotFound("foo".into()));
        assert_eq!(
            resp.to_value(),
            json!({"jsonrpc": "2.0", "id": 7, "error": {"code": -32601, "message": "Method not found: foo"}})
        );
    }
}
