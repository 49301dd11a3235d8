//! JSON-RPC method dispatch.
//!
//! Dispatch is stateless: each request is parsed, routed and answered on its
//! own, and every `tools/call` gets a freshly built connector.

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::connectors::{FuturesConnector, Payload};
use crate::mcp::{
    catalog,
    error::{DispatchError, DispatchResult},
    format::ResponseFormat,
    jsonrpc::{JsonRpcRequest, JsonRpcResponse},
    normalize::normalize_arguments,
    tools::{ToolCall, ToolName},
};

pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "KuCoin Futures MCP Server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds a new connector for each tool call
pub type ConnectorFactory = Arc<dyn Fn() -> Box<dyn FuturesConnector> + Send + Sync>;

/// Which HTTP flavour the request arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Plain JSON-RPC over POST. Errors are reported in the body with HTTP 200.
    Standard,
    /// Streamable HTTP. Errors are also reflected in the HTTP status.
    Streamable,
}

impl Transport {
    fn capabilities(self) -> Value {
        match self {
            Transport::Standard => json!({ "tools": {} }),
            Transport::Streamable => json!({ "tools": {}, "resources": {}, "prompts": {}, "logging": {} }),
        }
    }

    fn server_info(self) -> Value {
        let name = match self {
            Transport::Standard => SERVER_NAME.to_string(),
            Transport::Streamable => format!("{} (Streamable)", SERVER_NAME),
        };
        json!({ "name": name, "version": SERVER_VERSION })
    }

    fn method_not_found_status(self) -> StatusCode {
        match self {
            Transport::Standard => StatusCode::OK,
            Transport::Streamable => StatusCode::NOT_FOUND,
        }
    }

    fn tool_error_status(self) -> StatusCode {
        match self {
            Transport::Standard => StatusCode::OK,
            Transport::Streamable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body for non-POST requests: a server description, or capability
    /// discovery on the streamable endpoint.
    pub fn describe(self) -> Value {
        match self {
            Transport::Standard => json!({
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
                "description": "MCP server exposing the KuCoin Futures API as tools"
            }),
            Transport::Streamable => json!({
                "transport": "streamable-http",
                "protocolVersion": DEFAULT_PROTOCOL_VERSION,
                "serverInfo": self.server_info(),
                "capabilities": self.capabilities(),
                "endpoints": { "mcp": "/stream", "tools": "/stream" }
            }),
        }
    }
}

/// What the HTTP layer should send back
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json { status: StatusCode, body: Value },
    /// Notifications are acknowledged without a body
    NoContent,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Reply::Json { status: StatusCode::OK, body }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    connect: ConnectorFactory,
}

impl Dispatcher {
    pub fn new(connect: ConnectorFactory) -> Self {
        Self { connect }
    }

    pub async fn handle(&self, body: &[u8], format: ResponseFormat, transport: Transport) -> Reply {
        let request = match JsonRpcRequest::parse(body) {
            Ok(request) => request,
            Err(err) => {
                warn!("Rejected malformed JSON-RPC body");
                return Reply::Json {
                    status: StatusCode::BAD_REQUEST,
                    body: JsonRpcResponse::failure(Value::Null, &err).to_value(),
                };
            }
        };

        debug!(method = %request.method, id = %request.id, ?transport, "Dispatching");

        match request.method.as_str() {
            "initialize" => {
                let result = initialize_result(&request, transport);
                Reply::ok(JsonRpcResponse::success(request.id, result).to_value())
            }
            "tools/list" => {
                let result = json!({ "tools": catalog::tools() });
                Reply::ok(JsonRpcResponse::success(request.id, result).to_value())
            }
            "tools/call" => self.call_tool(request, format, transport).await,
            "ping" => Reply::ok(JsonRpcResponse::success(request.id, json!("pong")).to_value()),
            _ if request.is_notification() => Reply::NoContent,
            other => {
                let err = DispatchError::MethodNotFound(other.to_string());
                Reply::Json {
                    status: transport.method_not_found_status(),
                    body: JsonRpcResponse::failure(request.id, &err).to_value(),
                }
            }
        }
    }

    async fn call_tool(&self, request: JsonRpcRequest, format: ResponseFormat, transport: Transport) -> Reply {
        let name = request.param("name").and_then(Value::as_str).map(str::to_string);
        let arguments = request.param("arguments").cloned().unwrap_or(Value::Null);

        let result = match &name {
            Some(name) => self.run_tool(name, arguments).await,
            None => Err(DispatchError::InvalidParams("tools/call requires a tool name".to_string())),
        };

        match result {
            Ok(payload) => Reply::ok(format.wrap(request.id, payload)),
            Err(err) => {
                warn!(tool = name.as_deref().unwrap_or("<none>"), error = %err, "Tool call failed");
                Reply::Json {
                    status: transport.tool_error_status(),
                    body: JsonRpcResponse::failure(request.id, &err).to_value(),
                }
            }
        }
    }

    async fn run_tool(&self, name: &str, arguments: Value) -> DispatchResult<Payload> {
        let tool: ToolName = name.parse()?;
        let call = ToolCall::from_arguments(tool, normalize_arguments(arguments))?;

        let connector = (self.connect)();
        info!(%tool, exchange = connector.name(), "Executing tool");
        Ok(call.execute(connector.as_ref()).await?)
    }
}

fn initialize_result(request: &JsonRpcRequest, transport: Transport) -> Value {
    let version = request
        .param("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);

    json!({
        "protocolVersion": version,
        "capabilities": transport.capabilities(),
        "serverInfo": transport.server_info(),
    })
}
