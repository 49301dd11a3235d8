//! Tool names and typed tool calls.
//!
//! The tool set is closed: every name maps to exactly one connector
//! operation, and argument extraction happens once, up front.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::connectors::kucoin::with_client_oid;
use crate::connectors::{ConnectorError, FuturesConnector, OrderBookDepth, OrderFilter, OrderParams, Payload};
use crate::mcp::error::{DispatchError, DispatchResult};
use crate::mcp::normalize::is_falsy;

const DEFAULT_DEPTH: i64 = 20;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_CURRENCY: &str = "USDT";

/// Every tool exposed through `tools/list` and `tools/call`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetSymbols,
    GetTicker,
    GetOrderBook,
    GetKlines,
    GetSymbolDetail,
    AddOrder,
    CancelOrder,
    CancelAllOrders,
    GetOrders,
    GetOrderById,
    GetPositions,
    GetPosition,
    ModifyMargin,
    GetFundingRate,
    GetFundingHistory,
    GetAccountFutures,
    AddStopOrder,
    GetOpenOrders,
}

impl ToolName {
    pub const ALL: [ToolName; 18] = [
        ToolName::GetSymbols,
        ToolName::GetTicker,
        ToolName::GetOrderBook,
        ToolName::GetKlines,
        ToolName::GetSymbolDetail,
        ToolName::AddOrder,
        ToolName::CancelOrder,
        ToolName::CancelAllOrders,
        ToolName::GetOrders,
        ToolName::GetOrderById,
        ToolName::GetPositions,
        ToolName::GetPosition,
        ToolName::ModifyMargin,
        ToolName::GetFundingRate,
        ToolName::GetFundingHistory,
        ToolName::GetAccountFutures,
        ToolName::AddStopOrder,
        ToolName::GetOpenOrders,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::GetSymbols => "getSymbols",
            ToolName::GetTicker => "getTicker",
            ToolName::GetOrderBook => "getOrderBook",
            ToolName::GetKlines => "getKlines",
            ToolName::GetSymbolDetail => "getSymbolDetail",
            ToolName::AddOrder => "addOrder",
            ToolName::CancelOrder => "cancelOrder",
            ToolName::CancelAllOrders => "cancelAllOrders",
            ToolName::GetOrders => "getOrders",
            ToolName::GetOrderById => "getOrderById",
            ToolName::GetPositions => "getPositions",
            ToolName::GetPosition => "getPosition",
            ToolName::ModifyMargin => "modifyMargin",
            ToolName::GetFundingRate => "getFundingRate",
            ToolName::GetFundingHistory => "getFundingHistory",
            ToolName::GetAccountFutures => "getAccountFutures",
            ToolName::AddStopOrder => "addStopOrder",
            ToolName::GetOpenOrders => "getOpenOrders",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownTool(s.to_string()))
    }
}

/// A tool invocation with its arguments already extracted
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    GetSymbols,
    GetTicker { symbol: Option<String> },
    GetOrderBook { symbol: String, depth: OrderBookDepth },
    GetKlines { symbol: String, granularity: i64, from: Option<i64>, to: Option<i64> },
    GetSymbolDetail { symbol: String },
    AddOrder(OrderParams),
    CancelOrder { order_id: String },
    CancelAllOrders { symbol: Option<String> },
    GetOrders(OrderFilter),
    GetOrderById { order_id: String },
    GetPositions,
    GetPosition { symbol: String },
    ModifyMargin { symbol: String, margin: String },
    GetFundingRate { symbol: String },
    GetFundingHistory { symbol: String, from: Option<i64>, to: Option<i64> },
    GetAccountOverview { currency: String },
    AddStopOrder(OrderParams),
    GetOpenOrderStats { symbol: String },
}

impl ToolCall {
    /// Build a call from already-normalized arguments
    pub fn from_arguments(tool: ToolName, args: Value) -> DispatchResult<Self> {
        let call = match tool {
            ToolName::GetSymbols => ToolCall::GetSymbols,
            ToolName::GetTicker => ToolCall::GetTicker {
                symbol: string_arg(&args, "symbol"),
            },
            ToolName::GetOrderBook => ToolCall::GetOrderBook {
                symbol: required_string(&args, "symbol")?,
                depth: order_book_depth(&args),
            },
            ToolName::GetKlines => ToolCall::GetKlines {
                symbol: required_string(&args, "symbol")?,
                granularity: int_arg(&args, "granularity")?
                    .ok_or_else(|| missing("granularity"))?,
                from: int_arg(&args, "from")?,
                to: int_arg(&args, "to")?,
            },
            ToolName::GetSymbolDetail => ToolCall::GetSymbolDetail {
                symbol: required_string(&args, "symbol")?,
            },
            ToolName::AddOrder => ToolCall::AddOrder(with_client_oid(order_params(args)?)),
            ToolName::CancelOrder => ToolCall::CancelOrder {
                order_id: required_string(&args, "orderId")?,
            },
            ToolName::CancelAllOrders => ToolCall::CancelAllOrders {
                symbol: string_arg(&args, "symbol"),
            },
            ToolName::GetOrders => {
                let page_size = int_arg(&args, "pageSize")
                    .ok()
                    .flatten()
                    .filter(|p| *p > 0)
                    .and_then(|p| u32::try_from(p).ok())
                    .unwrap_or(DEFAULT_PAGE_SIZE);
                ToolCall::GetOrders(OrderFilter {
                    symbol: string_arg(&args, "symbol"),
                    status: string_arg(&args, "status"),
                    side: string_arg(&args, "side"),
                    page_size,
                })
            }
            ToolName::GetOrderById => ToolCall::GetOrderById {
                order_id: required_string(&args, "orderId")?,
            },
            ToolName::GetPositions => ToolCall::GetPositions,
            ToolName::GetPosition => ToolCall::GetPosition {
                symbol: required_string(&args, "symbol")?,
            },
            ToolName::ModifyMargin => ToolCall::ModifyMargin {
                symbol: required_string(&args, "symbol")?,
                margin: required_string(&args, "margin")?,
            },
            ToolName::GetFundingRate => ToolCall::GetFundingRate {
                symbol: required_string(&args, "symbol")?,
            },
            ToolName::GetFundingHistory => ToolCall::GetFundingHistory {
                symbol: required_string(&args, "symbol")?,
                from: int_arg(&args, "from")?,
                to: int_arg(&args, "to")?,
            },
            ToolName::GetAccountFutures => ToolCall::GetAccountOverview {
                currency: string_arg(&args, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            },
            ToolName::AddStopOrder => ToolCall::AddStopOrder(with_client_oid(order_params(args)?)),
            ToolName::GetOpenOrders => ToolCall::GetOpenOrderStats {
                symbol: required_string(&args, "symbol")?,
            },
        };
        Ok(call)
    }

    /// Run the call against a connector. One exchange request per call.
    pub async fn execute(&self, connector: &dyn FuturesConnector) -> Result<Payload, ConnectorError> {
        match self {
            ToolCall::GetSymbols => connector.get_symbols().await,
            ToolCall::GetTicker { symbol } => connector.get_ticker(symbol.as_deref()).await,
            ToolCall::GetOrderBook { symbol, depth } => connector.get_order_book(symbol, *depth).await,
            ToolCall::GetKlines { symbol, granularity, from, to } => {
                connector.get_klines(symbol, *granularity, *from, *to).await
            }
            ToolCall::GetSymbolDetail { symbol } => connector.get_symbol_detail(symbol).await,
            ToolCall::AddOrder(params) => connector.add_order(params.clone()).await,
            ToolCall::CancelOrder { order_id } => connector.cancel_order(order_id).await,
            ToolCall::CancelAllOrders { symbol } => connector.cancel_all_orders(symbol.as_deref()).await,
            ToolCall::GetOrders(filter) => connector.get_orders(filter).await,
            ToolCall::GetOrderById { order_id } => connector.get_order_by_id(order_id).await,
            ToolCall::GetPositions => connector.get_positions().await,
            ToolCall::GetPosition { symbol } => connector.get_position(symbol).await,
            ToolCall::ModifyMargin { symbol, margin } => connector.modify_margin(symbol, margin).await,
            ToolCall::GetFundingRate { symbol } => connector.get_funding_rate(symbol).await,
            ToolCall::GetFundingHistory { symbol, from, to } => {
                connector.get_funding_history(symbol, *from, *to).await
            }
            ToolCall::GetAccountOverview { currency } => connector.get_account_overview(currency).await,
            ToolCall::AddStopOrder(params) => connector.add_stop_order(params.clone()).await,
            ToolCall::GetOpenOrderStats { symbol } => connector.get_open_order_stats(symbol).await,
        }
    }
}

// =========================================================================
// Argument Helpers
// =========================================================================

fn missing(key: &str) -> DispatchError {
    DispatchError::Arguments(format!("Missing required argument '{}'", key))
}

/// Strings pass through, numbers are rendered; empty strings count as absent.
fn string_arg(args: &Value, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_string(args: &Value, key: &str) -> DispatchResult<String> {
    string_arg(args, key).ok_or_else(|| missing(key))
}

/// Accepts JSON numbers and numeric strings. Fractions are truncated.
fn int_arg(args: &Value, key: &str) -> DispatchResult<Option<i64>> {
    let invalid = || DispatchError::Arguments(format!("Argument '{}' must be a number", key));
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            .map(Some)
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

/// Falsy depths take the default. A depth that is not a number is left for
/// the exchange to judge, so it selects the large snapshot.
fn order_book_depth(args: &Value) -> OrderBookDepth {
    match args.get("depth") {
        None => OrderBookDepth::from_requested(DEFAULT_DEPTH),
        Some(v) if is_falsy(v) => OrderBookDepth::from_requested(DEFAULT_DEPTH),
        Some(_) => match int_arg(args, "depth") {
            Ok(Some(depth)) => OrderBookDepth::from_requested(depth),
            _ => OrderBookDepth::Depth100,
        },
    }
}

fn order_params(args: Value) -> DispatchResult<OrderParams> {
    match args {
        Value::Object(map) => Ok(map),
        _ => Err(DispatchError::Arguments("Order parameters must be a JSON object".to_string())),
    }
}
