//! KuCoin Futures Connector
//!
//! Maps each futures operation onto one KuCoin Futures REST endpoint.

mod rest;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::connectors::{
    auth::{build_query_string, url_encode, ApiCredentials},
    error::ConnectorError,
    FuturesConnector, OrderFilter, OrderParams, Payload,
};

pub use rest::{KucoinRestClient, DEFAULT_BASE_URL};

/// Field KuCoin uses to deduplicate order submissions
pub const CLIENT_OID: &str = "clientOid";

/// Partial order book sizes offered by KuCoin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBookDepth {
    Depth20,
    Depth100,
}

impl OrderBookDepth {
    /// Anything up to 20 levels uses the small snapshot, everything else the large one.
    pub fn from_requested(depth: i64) -> Self {
        if depth <= 20 {
            OrderBookDepth::Depth20
        } else {
            OrderBookDepth::Depth100
        }
    }

    pub fn levels(self) -> u32 {
        match self {
            OrderBookDepth::Depth20 => 20,
            OrderBookDepth::Depth100 => 100,
        }
    }
}

/// KuCoin Futures connector
#[derive(Clone)]
pub struct KucoinFuturesClient {
    rest: KucoinRestClient,
}

impl KucoinFuturesClient {
    pub fn new(client: Client, credentials: Option<ApiCredentials>) -> Self {
        Self {
            rest: KucoinRestClient::new(client, credentials),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.rest = self.rest.with_base_url(base_url);
        self
    }

    async fn get(&self, path: &str) -> Result<Payload, ConnectorError> {
        self.rest.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Payload, ConnectorError> {
        self.rest.request(Method::POST, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Payload, ConnectorError> {
        self.rest.request(Method::DELETE, path, None).await
    }
}

#[async_trait]
impl FuturesConnector for KucoinFuturesClient {
    fn name(&self) -> &str {
        "kucoin-futures"
    }

    async fn get_symbols(&self) -> Result<Payload, ConnectorError> {
        self.get("/api/v1/contracts/active").await
    }

    #[instrument(skip(self))]
    async fn get_ticker(&self, symbol: Option<&str>) -> Result<Payload, ConnectorError> {
        self.get(&ticker_path(symbol)).await
    }

    #[instrument(skip(self))]
    async fn get_order_book(&self, symbol: &str, depth: OrderBookDepth) -> Result<Payload, ConnectorError> {
        self.get(&order_book_path(symbol, depth)).await
    }

    #[instrument(skip(self))]
    async fn get_klines(
        &self,
        symbol: &str,
        granularity: i64,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Payload, ConnectorError> {
        self.get(&klines_path(symbol, granularity, from, to)).await
    }

    #[instrument(skip(self))]
    async fn get_symbol_detail(&self, symbol: &str) -> Result<Payload, ConnectorError> {
        self.get(&format!("/api/v1/contracts/{}", url_encode(symbol))).await
    }

    #[instrument(skip(self, params))]
    async fn add_order(&self, params: OrderParams) -> Result<Payload, ConnectorError> {
        let params = with_client_oid(params);
        info!(client_oid = ?params.get(CLIENT_OID), "Placing order");
        self.post("/api/v1/orders", &Value::Object(params)).await
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, order_id: &str) -> Result<Payload, ConnectorError> {
        self.delete(&format!("/api/v1/orders/{}", url_encode(order_id))).await
    }

    #[instrument(skip(self))]
    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Payload, ConnectorError> {
        self.delete(&path_with_query("/api/v1/orders", &[("symbol", symbol.map(str::to_string))])).await
    }

    #[instrument(skip(self))]
    async fn get_orders(&self, filter: &OrderFilter) -> Result<Payload, ConnectorError> {
        self.get(&orders_path(filter)).await
    }

    #[instrument(skip(self))]
    async fn get_order_by_id(&self, order_id: &str) -> Result<Payload, ConnectorError> {
        self.get(&format!("/api/v1/orders/{}", url_encode(order_id))).await
    }

    #[instrument(skip(self, params))]
    async fn add_stop_order(&self, params: OrderParams) -> Result<Payload, ConnectorError> {
        let params = with_client_oid(params);
        info!(client_oid = ?params.get(CLIENT_OID), "Placing stop order");
        self.post("/api/v1/st-orders", &Value::Object(params)).await
    }

    #[instrument(skip(self))]
    async fn get_open_order_stats(&self, symbol: &str) -> Result<Payload, ConnectorError> {
        self.get(&path_with_query("/api/v1/openOrderStatistics", &[("symbol", Some(symbol.to_string()))])).await
    }

    async fn get_positions(&self) -> Result<Payload, ConnectorError> {
        self.get("/api/v1/positions").await
    }

    #[instrument(skip(self))]
    async fn get_position(&self, symbol: &str) -> Result<Payload, ConnectorError> {
        self.get(&path_with_query("/api/v1/position", &[("symbol", Some(symbol.to_string()))])).await
    }

    #[instrument(skip(self))]
    async fn modify_margin(&self, symbol: &str, margin: &str) -> Result<Payload, ConnectorError> {
        let body = json!({
            "symbol": symbol,
            "margin": margin,
        });
        self.post("/api/v1/position/margin/deposit-margin", &body).await
    }

    #[instrument(skip(self))]
    async fn get_funding_rate(&self, symbol: &str) -> Result<Payload, ConnectorError> {
        self.get(&format!("/api/v1/funding-rate/{}/current", url_encode(symbol))).await
    }

    #[instrument(skip(self))]
    async fn get_funding_history(
        &self,
        symbol: &str,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Payload, ConnectorError> {
        let path = path_with_query(
            "/api/v1/contract/funding-fees",
            &[
                ("symbol", Some(symbol.to_string())),
                ("from", timestamp_param(from)),
                ("to", timestamp_param(to)),
            ],
        );
        self.get(&path).await
    }

    #[instrument(skip(self))]
    async fn get_account_overview(&self, currency: &str) -> Result<Payload, ConnectorError> {
        self.get(&path_with_query("/api/v1/account-overview", &[("currency", Some(currency.to_string()))])).await
    }
}

// =========================================================================
// Path Helpers
// =========================================================================

/// Append only the parameters that are present and non-empty.
fn path_with_query(path: &str, params: &[(&str, Option<String>)]) -> String {
    let present: Vec<(&str, String)> = params
        .iter()
        .filter_map(|(k, v)| match v {
            Some(v) if !v.is_empty() => Some((*k, v.clone())),
            _ => None,
        })
        .collect();

    if present.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, build_query_string(&present))
    }
}

/// Zero timestamps count as "not given".
fn timestamp_param(ts: Option<i64>) -> Option<String> {
    ts.filter(|t| *t != 0).map(|t| t.to_string())
}

fn ticker_path(symbol: Option<&str>) -> String {
    path_with_query("/api/v1/ticker", &[("symbol", symbol.map(str::to_string))])
}

fn order_book_path(symbol: &str, depth: OrderBookDepth) -> String {
    path_with_query(
        &format!("/api/v1/level2/depth{}", depth.levels()),
        &[("symbol", Some(symbol.to_string()))],
    )
}

fn klines_path(symbol: &str, granularity: i64, from: Option<i64>, to: Option<i64>) -> String {
    path_with_query(
        "/api/v1/kline/query",
        &[
            ("symbol", Some(symbol.to_string())),
            ("granularity", Some(granularity.to_string())),
            ("from", timestamp_param(from)),
            ("to", timestamp_param(to)),
        ],
    )
}

fn orders_path(filter: &OrderFilter) -> String {
    path_with_query(
        "/api/v1/orders",
        &[
            ("symbol", filter.symbol.clone()),
            ("status", filter.status.clone()),
            ("side", filter.side.clone()),
            ("pageSize", Some(filter.page_size.to_string())),
        ],
    )
}

/// Ensure the order carries a `clientOid`, generating a UUID when the caller
/// left it out (absent, null, empty or `false`).
pub fn with_client_oid(mut params: OrderParams) -> OrderParams {
    let missing = match params.get(CLIENT_OID) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if missing {
        params.insert(CLIENT_OID.to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::collections::HashSet;

    fn client(url: &str) -> KucoinFuturesClient {
        KucoinFuturesClient::new(Client::new(), Some(ApiCredentials::new("k", "s", "p"))).with_base_url(url)
    }

    #[test]
    fn test_order_book_depth_boundary() {
        for depth in 1..=20 {
            assert_eq!(OrderBookDepth::from_requested(depth), OrderBookDepth::Depth20);
        }
        assert_eq!(OrderBookDepth::from_requested(21), OrderBookDepth::Depth100);
        assert_eq!(OrderBookDepth::from_requested(100), OrderBookDepth::Depth100);
        assert_eq!(OrderBookDepth::from_requested(500), OrderBookDepth::Depth100);
    }

    #[test]
    fn test_order_book_path() {
        assert_eq!(order_book_path("XBTUSDTM", OrderBookDepth::Depth20), "/api/v1/level2/depth20?symbol=XBTUSDTM");
        assert_eq!(order_book_path("XBTUSDTM", OrderBookDepth::Depth100), "/api/v1/level2/depth100?symbol=XBTUSDTM");
    }

    #[test]
    fn test_ticker_path_optional_symbol() {
        assert_eq!(ticker_path(None), "/api/v1/ticker");
        assert_eq!(ticker_path(Some("")), "/api/v1/ticker");
        assert_eq!(ticker_path(Some("ETHUSDTM")), "/api/v1/ticker?symbol=ETHUSDTM");
    }

    #[test]
    fn test_klines_path_omits_absent_range() {
        assert_eq!(klines_path("XBTUSDTM", 60, None, None), "/api/v1/kline/query?symbol=XBTUSDTM&granularity=60");
        assert_eq!(
            klines_path("XBTUSDTM", 60, Some(1000), Some(0)),
            "/api/v1/kline/query?symbol=XBTUSDTM&granularity=60&from=1000"
        );
    }

    #[test]
    fn test_orders_path_filters() {
        assert_eq!(orders_path(&OrderFilter::default()), "/api/v1/orders?pageSize=20");

        let filter = OrderFilter {
            symbol: Some("XBTUSDTM".to_string()),
            status: None,
            side: Some("sell".to_string()),
            page_size: 50,
        };
        assert_eq!(orders_path(&filter), "/api/v1/orders?symbol=XBTUSDTM&side=sell&pageSize=50");
    }

    #[test]
    fn test_with_client_oid_generates_unique_tokens() {
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let params = with_client_oid(OrderParams::new());
            let oid = params[CLIENT_OID].as_str().unwrap().to_string();
            assert!(!oid.is_empty());
            assert!(seen.insert(oid), "clientOid repeated");
        }
    }

    #[test]
    fn test_with_client_oid_keeps_caller_token() {
        let mut params = OrderParams::new();
        params.insert(CLIENT_OID.to_string(), json!("my-oid-1"));
        assert_eq!(with_client_oid(params)[CLIENT_OID], json!("my-oid-1"));

        let mut empty = OrderParams::new();
        empty.insert(CLIENT_OID.to_string(), json!(""));
        assert_ne!(with_client_oid(empty)[CLIENT_OID], json!(""));
    }

    #[tokio::test]
    async fn test_add_order_posts_generated_client_oid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/api/v1/orders")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"symbol": "XBTUSDTM", "side": "buy", "size": 1})),
                Matcher::Regex(r#""clientOid":"[0-9a-f-]{36}""#.to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"code":"200000","data":{"orderId":"1"}}"#)
            .create_async()
            .await;

        let mut params = OrderParams::new();
        params.insert("symbol".to_string(), json!("XBTUSDTM"));
        params.insert("side".to_string(), json!("buy"));
        params.insert("size".to_string(), json!(1));

        let result = client(&server.url()).add_order(params).await.unwrap();
        assert_eq!(result["data"]["orderId"], "1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cancel_order_uses_delete() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("DELETE", "/api/v1/orders/5bd6e9286d99522a52e458de")
            .with_status(200)
            .with_body(r#"{"code":"200000","data":{"cancelledOrderIds":["5bd6e9286d99522a52e458de"]}}"#)
            .create_async()
            .await;

        client(&server.url()).cancel_order("5bd6e9286d99522a52e458de").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_account_overview_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/api/v1/account-overview")
            .match_query(Matcher::UrlEncoded("currency".to_string(), "USDT".to_string()))
            .with_status(200)
            .with_body(r#"{"code":"200000","data":{"currency":"USDT"}}"#)
            .create_async()
            .await;

        let result = client(&server.url()).get_account_overview("USDT").await.unwrap();
        assert_eq!(result["data"]["currency"], "USDT");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_modify_margin_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/api/v1/position/margin/deposit-margin")
            .match_body(Matcher::Json(json!({"symbol": "XBTUSDTM", "margin": "2.5"})))
            .with_status(200)
            .with_body(r#"{"code":"200000"}"#)
            .create_async()
            .await;

        client(&server.url()).modify_margin("XBTUSDTM", "2.5").await.unwrap();
        mock.assert_async().await;
    }
}
