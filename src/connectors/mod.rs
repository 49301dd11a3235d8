//! Exchange Connectors
//!
//! This module provides the interface the MCP dispatcher uses to reach the
//! exchange. The connector is a thin passthrough: every operation is one
//! signed HTTP call and returns the exchange's JSON body untouched.
//! - Market data (symbols, ticker, order book, klines, contract detail)
//! - Order management (place, cancel, query, stop orders)
//! - Positions and margin
//! - Funding and account overview

pub mod auth;
pub mod error;
pub mod kucoin;

// Re-export commonly used items
pub use auth::ApiCredentials;
pub use error::ConnectorError;
pub use kucoin::{KucoinFuturesClient, OrderBookDepth};

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Exchange response body, passed through without reshaping
pub type Payload = Value;

/// Caller-supplied order parameters, forwarded to the exchange as the JSON body
pub type OrderParams = Map<String, Value>;

/// Base trait for futures exchange connectors
#[async_trait]
pub trait FuturesConnector: Send + Sync {
    /// Get the exchange name
    fn name(&self) -> &str;

    // =========================================================================
    // Market Data
    // =========================================================================

    /// List all active contracts
    async fn get_symbols(&self) -> Result<Payload, ConnectorError>;

    /// Ticker for one symbol, or for all symbols when `symbol` is `None`
    async fn get_ticker(&self, symbol: Option<&str>) -> Result<Payload, ConnectorError>;

    /// Partial order book snapshot
    async fn get_order_book(&self, symbol: &str, depth: OrderBookDepth) -> Result<Payload, ConnectorError>;

    /// Candlesticks; `from`/`to` are unix timestamps in ms
    async fn get_klines(
        &self,
        symbol: &str,
        granularity: i64,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Payload, ConnectorError>;

    /// Contract specification
    async fn get_symbol_detail(&self, symbol: &str) -> Result<Payload, ConnectorError>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order. A `clientOid` is generated when the caller did not supply one.
    async fn add_order(&self, params: OrderParams) -> Result<Payload, ConnectorError>;

    async fn cancel_order(&self, order_id: &str) -> Result<Payload, ConnectorError>;

    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Payload, ConnectorError>;

    async fn get_orders(&self, filter: &OrderFilter) -> Result<Payload, ConnectorError>;

    async fn get_order_by_id(&self, order_id: &str) -> Result<Payload, ConnectorError>;

    /// Place a take-profit / stop-loss order. Same `clientOid` rule as `add_order`.
    async fn add_stop_order(&self, params: OrderParams) -> Result<Payload, ConnectorError>;

    async fn get_open_order_stats(&self, symbol: &str) -> Result<Payload, ConnectorError>;

    // =========================================================================
    // Positions
    // =========================================================================

    async fn get_positions(&self) -> Result<Payload, ConnectorError>;

    async fn get_position(&self, symbol: &str) -> Result<Payload, ConnectorError>;

    /// Deposit margin into an isolated position. `margin` is sent as a string.
    async fn modify_margin(&self, symbol: &str, margin: &str) -> Result<Payload, ConnectorError>;

    // =========================================================================
    // Funding & Account
    // =========================================================================

    async fn get_funding_rate(&self, symbol: &str) -> Result<Payload, ConnectorError>;

    async fn get_funding_history(
        &self,
        symbol: &str,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Payload, ConnectorError>;

    async fn get_account_overview(&self, currency: &str) -> Result<Payload, ConnectorError>;
}

/// Filters for listing orders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub symbol: Option<String>,
    /// `active` or `done`
    pub status: Option<String>,
    /// `buy` or `sell`
    pub side: Option<String>,
    pub page_size: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            symbol: None,
            status: None,
            side: None,
            page_size: 20,
        }
    }
}
