//! HTTP front end for the MCP dispatcher.
//!
//! Uses `axum` for routing. `/stream` speaks the streamable HTTP transport,
//! every other path the standard one. All requests except CORS preflights
//! pass the auth gate first.

pub mod auth;

use axum::{
    body::Bytes,
    extract::{Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::any,
    Router,
};
use reqwest::Client;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::connectors::{ApiCredentials, FuturesConnector, KucoinFuturesClient};
use crate::mcp::{jsonrpc::JSONRPC_VERSION, ConnectorFactory, Dispatcher, Reply, ResponseFormat, Transport};

pub use auth::{AuthError, AuthGate};

pub const MCP_SESSION_ID: &str = "mcp-session-id";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Accept, Mcp-Session-Id, X-MCP-Auth-Key, Authorization";

/// Shared application state. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub gate: Arc<AuthGate>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, gate: AuthGate) -> Self {
        Self {
            dispatcher,
            gate: Arc::new(gate),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        let factory = kucoin_factory(client, config.credentials.clone(), config.base_url.clone());
        Ok(Self::new(Dispatcher::new(factory), AuthGate::new(config.auth_keys.clone())))
    }
}

/// Every tool call gets its own connector sharing one HTTP connection pool.
pub fn kucoin_factory(client: Client, credentials: Option<ApiCredentials>, base_url: String) -> ConnectorFactory {
    Arc::new(move || {
        Box::new(KucoinFuturesClient::new(client.clone(), credentials.clone()).with_base_url(&base_url))
            as Box<dyn FuturesConnector>
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stream", any(stream_handler))
        .fallback(mcp_handler)
        .layer(middleware::from_fn_with_state(state.clone(), gate))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server. Blocks until the server shuts down.
pub async fn serve(config: Config, bind: SocketAddr) -> anyhow::Result<()> {
    if config.auth_keys.is_empty() {
        warn!("No MCP_AUTH_KEY / MCP_AUTH_KEYS configured, accepting unauthenticated requests");
    } else {
        info!(keys = config.auth_keys.len(), "Auth gate enabled");
    }
    if config.credentials.is_none() {
        warn!("KuCoin API credentials not configured, tool calls will fail");
    }

    let state = AppState::from_config(&config)?;
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, base_url = %config.base_url, "Starting MCP server");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// =========================================================================
// Middleware
// =========================================================================

async fn gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight();
    }

    if let Err(err) = state.gate.check(request.headers()) {
        warn!(path = %request.uri().path(), error = %err, "Rejected unauthenticated request");
        return unauthorized(&err);
    }

    next.run(request).await
}

fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
        ],
    )
        .into_response()
}

fn unauthorized(err: &AuthError) -> Response {
    let body = json!({
        "jsonrpc": JSONRPC_VERSION,
        "error": { "code": 401, "message": err.to_string() }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

// =========================================================================
// Handlers
// =========================================================================

/// Query pairs in arrival order. Repeated keys are allowed; the first
/// `format` wins.
type QueryPairs = Vec<(String, String)>;

fn response_format(query: &QueryPairs) -> ResponseFormat {
    let format = query.iter().find(|(key, _)| key == "format").map(|(_, value)| value.as_str());
    ResponseFormat::from_query(format)
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json { status, body } => (status, Json(body)).into_response(),
            Reply::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

async fn mcp_handler(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<QueryPairs>,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return Json(Transport::Standard.describe()).into_response();
    }

    state
        .dispatcher
        .handle(&body, response_format(&query), Transport::Standard)
        .await
        .into_response()
}

async fn stream_handler(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<QueryPairs>,
    body: Bytes,
) -> Response {
    let mut response = if method == Method::POST {
        state
            .dispatcher
            .handle(&body, response_format(&query), Transport::Streamable)
            .await
            .into_response()
    } else if method == Method::GET {
        Json(Transport::Streamable.describe()).into_response()
    } else {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    if let Ok(session) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        headers.insert(MCP_SESSION_ID, session);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http;
    use mockito::Matcher;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn config(base_url: &str, auth_keys: Vec<String>) -> Config {
        Config {
            credentials: Some(ApiCredentials::new("key", "secret", "pass")),
            base_url: base_url.to_string(),
            http_timeout: Duration::from_secs(5),
            auth_keys,
        }
    }

    fn app(base_url: &str, auth_keys: Vec<String>) -> Router {
        router(AppState::from_config(&config(base_url, auth_keys)).unwrap())
    }

    fn post(uri: &str, body: &str) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const TICKER_CALL: &str =
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"getTicker","arguments":{"symbol":"XBTUSDTM"}}}"#;

    #[tokio::test]
    async fn test_raw_tool_call_returns_exchange_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/ticker")
            .match_query(Matcher::UrlEncoded("symbol".into(), "XBTUSDTM".into()))
            .match_header("KC-API-KEY", "key")
            .match_header("KC-API-KEY-VERSION", "2")
            .with_status(200)
            .with_body(r#"{"code":"200000","data":{"price":"65000"}}"#)
            .create_async()
            .await;

        let response = app(&server.url(), vec![]).oneshot(post("/mcp?format=raw", TICKER_CALL)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(json_body(response).await, serde_json::json!({"code": "200000", "data": {"price": "65000"}}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_content_format_on_root_path() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/ticker")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":"200000"}"#)
            .create_async()
            .await;

        let response = app(&server.url(), vec![]).oneshot(post("/", TICKER_CALL)).await.unwrap();
        let body = json_body(response).await;

        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["content"][0]["type"], "text");
        assert_eq!(body["result"]["content"][0]["text"], r#"{"code":"200000"}"#);
    }

    #[tokio::test]
    async fn test_exchange_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/ticker")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"code":"400100","msg":"bad symbol"}"#)
            .create_async()
            .await;

        let response = app(&server.url(), vec![]).oneshot(post("/mcp", TICKER_CALL)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], -1);
        assert_eq!(body["error"]["message"], r#"KuCoin API Error: 400 - {"code":"400100","msg":"bad symbol"}"#);

        let response = app(&server.url(), vec![]).oneshot(post("/stream", TICKER_CALL)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_first_format_value_wins() {
        let pairs = |items: &[(&str, &str)]| -> QueryPairs {
            items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };
        assert_eq!(response_format(&pairs(&[])), ResponseFormat::Content);
        assert_eq!(response_format(&pairs(&[("format", "raw"), ("format", "hybrid")])), ResponseFormat::Raw);
        assert_eq!(response_format(&pairs(&[("x", "1"), ("format", "hybrid")])), ResponseFormat::Hybrid);
    }

    #[tokio::test]
    async fn test_repeated_format_parameter() {
        let app = app("http://127.0.0.1:1", vec![]);
        let ping = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;

        let response = app.clone().oneshot(post("/mcp?format=raw&format=hybrid", ping)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": "pong"}));

        let response = app.oneshot(post("/stream?format=raw&format=raw", ping)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(MCP_SESSION_ID));
        assert_eq!(json_body(response).await["result"], "pong");
    }

    #[tokio::test]
    async fn test_raw_format_from_repeated_parameter() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/ticker")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":"200000"}"#)
            .create_async()
            .await;

        let response = app(&server.url(), vec![])
            .oneshot(post("/mcp?format=raw&format=hybrid", TICKER_CALL))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, serde_json::json!({"code": "200000"}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let response = app("http://127.0.0.1:1", vec![]).oneshot(post("/mcp", "{not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_makes_no_exchange_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let body = r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"doStuff","arguments":{}}}"#;
        let response = app(&server.url(), vec![]).oneshot(post("/mcp", body)).await.unwrap();

        assert_eq!(
            json_body(response).await,
            serde_json::json!({"jsonrpc": "2.0", "id": 9, "error": {"code": -1, "message": "Unknown tool: doStuff"}})
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_required() {
        let app = app("http://127.0.0.1:1", vec!["k1".into()]);
        let ping = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;

        let response = app.clone().oneshot(post("/mcp", ping)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], 401);
        assert_eq!(
            body["error"]["message"],
            "Authentication required. Provide X-MCP-Auth-Key header or Authorization: Bearer <key>"
        );

        let mut request = post("/mcp", ping);
        request.headers_mut().insert("x-mcp-auth-key", HeaderValue::from_static("nope"));
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(json_body(response).await["error"]["message"], "Invalid authentication key");

        let mut request = post("/mcp", ping);
        request.headers_mut().insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer k1"));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["result"], "pong");
    }

    #[tokio::test]
    async fn test_preflight_bypasses_auth() {
        let app = app("http://127.0.0.1:1", vec!["k1".into()]);
        let request = http::Request::builder().method(Method::OPTIONS).uri("/mcp").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }

    #[tokio::test]
    async fn test_get_describes_server() {
        let request = http::Request::builder().uri("/mcp").body(Body::empty()).unwrap();
        let response = app("http://127.0.0.1:1", vec![]).oneshot(request).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["name"], "KuCoin Futures MCP Server");
        assert!(body["description"].is_string());
    }

    #[tokio::test]
    async fn test_stream_transport() {
        let app = app("http://127.0.0.1:1", vec![]);

        let request = http::Request::builder().uri("/stream").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key(MCP_SESSION_ID));
        let body = json_body(response).await;
        assert_eq!(body["transport"], "streamable-http");
        assert_eq!(body["endpoints"]["mcp"], "/stream");

        let unknown = r#"{"jsonrpc":"2.0","id":2,"method":"resources/read"}"#;
        let response = app.clone().oneshot(post("/stream", unknown)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = http::Request::builder().method(Method::PUT).uri("/stream").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let note = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let response = app.oneshot(post("/stream", note)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key(MCP_SESSION_ID));
    }

    #[tokio::test]
    async fn test_session_ids_are_fresh() {
        let app = app("http://127.0.0.1:1", vec![]);
        let ping = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;

        let first = app.clone().oneshot(post("/stream", ping)).await.unwrap();
        let second = app.oneshot(post("/stream", ping)).await.unwrap();
        assert_ne!(first.headers()[MCP_SESSION_ID], second.headers()[MCP_SESSION_ID]);
    }
}
