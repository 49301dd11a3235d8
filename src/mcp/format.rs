//! Response shapes for successful `tools/call` results.

use serde_json::{json, Value};

use crate::mcp::jsonrpc::JsonRpcResponse;

/// Selected with the `format` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Bare exchange payload, no envelope (plain HTTP workflows)
    Raw,
    /// JSON-RPC envelope with the payload as `result`
    Hybrid,
    /// JSON-RPC envelope with the payload as MCP text content
    #[default]
    Content,
}

impl ResponseFormat {
    /// Unknown or missing selectors fall back to MCP content.
    pub fn from_query(format: Option<&str>) -> Self {
        match format {
            Some("raw") => ResponseFormat::Raw,
            Some("hybrid") => ResponseFormat::Hybrid,
            _ => ResponseFormat::Content,
        }
    }

    pub fn wrap(self, id: Value, payload: Value) -> Value {
        match self {
            ResponseFormat::Raw => payload,
            ResponseFormat::Hybrid => JsonRpcResponse::success(id, payload).to_value(),
            ResponseFormat::Content => {
                let result = json!({
                    "content": [{ "type": "text", "text": payload.to_string() }]
                });
                JsonRpcResponse::success(id, result).to_value()
            }
        }
    }
}
