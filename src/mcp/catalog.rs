//! Static tool catalog returned by `tools/list`.
//!
//! Schemas describe the arguments for callers; they are not enforced here.
//! The exchange validates order semantics itself.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::LazyLock;

use crate::mcp::tools::ToolName;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static CATALOG: LazyLock<Vec<ToolDescriptor>> =
    LazyLock::new(|| ToolName::ALL.iter().map(|tool| descriptor(*tool)).collect());

/// All tool descriptors, in a stable order
pub fn tools() -> &'static [ToolDescriptor] {
    &CATALOG
}

fn symbol_prop() -> Value {
    json!({ "type": "string", "description": "Trading symbol (e.g., XBTUSDTM)" })
}

fn timestamp_prop(what: &str) -> Value {
    json!({ "type": "number", "description": format!("{} timestamp (Unix timestamp in milliseconds)", what) })
}

fn symbol_only_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "symbol": symbol_prop() },
        "required": ["symbol"]
    })
}

fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn descriptor(tool: ToolName) -> ToolDescriptor {
    let (description, input_schema) = match tool {
        ToolName::GetSymbols => (
            "Get all available futures trading symbols/contracts",
            empty_schema(),
        ),
        ToolName::GetTicker => (
            "Get ticker information for a specific symbol or all symbols",
            json!({
                "type": "object",
                "properties": { "symbol": symbol_prop() }
            }),
        ),
        ToolName::GetOrderBook => (
            "Get part order book depth data (aggregated by price) for a symbol. Uses the partial order book endpoints for faster responses and less traffic.",
            json!({
                "type": "object",
                "properties": {
                    "symbol": symbol_prop(),
                    "depth": {
                        "type": "number",
                        "description": "Order book depth. Values 1-20 use depth20, larger values use depth100",
                        "enum": [20, 100],
                        "default": 20
                    }
                },
                "required": ["symbol"]
            }),
        ),
        ToolName::GetKlines => (
            "Get klines/candlestick data for a specific symbol",
            json!({
                "type": "object",
                "properties": {
                    "symbol": symbol_prop(),
                    "granularity": {
                        "type": "number",
                        "description": "Time granularity in minutes (1, 5, 15, 30, 60, 120, 240, 480, 720, 1440, 10080)"
                    },
                    "from": timestamp_prop("Start"),
                    "to": timestamp_prop("End")
                },
                "required": ["symbol", "granularity"]
            }),
        ),
        ToolName::GetSymbolDetail => (
            "Get contract specifications and trading parameters for a futures symbol: lot size, tick size, max order quantity, fee rates, pricing information and trading status. Useful for checking trading rules before placing orders.",
            symbol_only_schema(),
        ),
        ToolName::AddOrder => (
            "Place a new futures order",
            json!({
                "type": "object",
                "properties": {
                    "symbol": symbol_prop(),
                    "side": { "type": "string", "enum": ["buy", "sell"], "description": "Order side" },
                    "type": { "type": "string", "enum": ["limit", "market"], "description": "Order type" },
                    "size": { "type": "number", "description": "Order size" },
                    "price": { "type": "number", "description": "Order price (required for limit orders)" },
                    "clientOid": { "type": "string", "description": "Unique client order identifier. Generated when omitted." },
                    "leverage": { "type": "number", "description": "Leverage for the order" }
                },
                "required": ["symbol", "side", "type", "size"]
            }),
        ),
        ToolName::CancelOrder => (
            "Cancel a specific order by ID",
            json!({
                "type": "object",
                "properties": {
                    "orderId": { "type": "string", "description": "Order ID to cancel" }
                },
                "required": ["orderId"]
            }),
        ),
        ToolName::CancelAllOrders => (
            "Cancel all orders or all orders for a specific symbol",
            json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Trading symbol (optional - cancel all orders for this symbol)" }
                }
            }),
        ),
        ToolName::GetOrders => (
            "Get list of orders with optional filtering",
            json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Trading symbol" },
                    "status": { "type": "string", "enum": ["active", "done"], "description": "Order status filter" },
                    "side": { "type": "string", "enum": ["buy", "sell"], "description": "Order side filter" },
                    "pageSize": {
                        "type": "number",
                        "description": "Number of orders to return",
                        "default": 20,
                        "minimum": 1,
                        "maximum": 100
                    }
                }
            }),
        ),
        ToolName::GetOrderById => (
            "Get detailed information about a specific order",
            json!({
                "type": "object",
                "properties": {
                    "orderId": { "type": "string", "description": "Order ID to fetch" }
                },
                "required": ["orderId"]
            }),
        ),
        ToolName::GetPositions => ("Get all open positions", empty_schema()),
        ToolName::GetPosition => (
            "Get position details for a specific symbol",
            symbol_only_schema(),
        ),
        ToolName::ModifyMargin => (
            "Add margin to an isolated position",
            json!({
                "type": "object",
                "properties": {
                    "symbol": symbol_prop(),
                    "margin": { "type": "number", "description": "Margin amount to add" }
                },
                "required": ["symbol", "margin"]
            }),
        ),
        ToolName::GetFundingRate => (
            "Get current funding rate for a symbol",
            symbol_only_schema(),
        ),
        ToolName::GetFundingHistory => (
            "Get funding fee history for a symbol",
            json!({
                "type": "object",
                "properties": {
                    "symbol": symbol_prop(),
                    "from": timestamp_prop("Start"),
                    "to": timestamp_prop("End")
                },
                "required": ["symbol"]
            }),
        ),
        ToolName::GetAccountFutures => (
            "Get futures account overview including balance, equity, PNL and risk information for one currency (defaults to USDT)",
            json!({
                "type": "object",
                "properties": {
                    "currency": {
                        "type": "string",
                        "description": "Account currency (defaults to USDT if not specified)",
                        "enum": ["USDT", "USDC", "XBT", "ETH"],
                        "default": "USDT"
                    }
                },
                "required": ["currency"]
            }),
        ),
        ToolName::AddStopOrder => (
            "Place a take profit and/or stop loss order. REQUIRED: symbol, side, leverage (integer), stopPriceType ('MP' recommended), at least one trigger price, and exactly one quantity (size/qty/valueQty). For limit orders also provide 'price'. The order executes automatically when the price reaches a trigger level.",
            stop_order_schema(),
        ),
        ToolName::GetOpenOrders => (
            "Get open order statistics for a symbol",
            symbol_only_schema(),
        ),
    };

    ToolDescriptor {
        name: tool.as_str(),
        description,
        input_schema,
    }
}

fn stop_order_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "clientOid": {
                "type": "string",
                "description": "Unique client order ID (max 40 chars: letters, numbers, underscore, hyphen). Generated when omitted.",
                "maxLength": 40,
                "pattern": "^[a-zA-Z0-9_-]+$"
            },
            "symbol": {
                "type": "string",
                "description": "Futures contract symbol (e.g., XBTUSDTM, ETHUSDTM)"
            },
            "side": {
                "type": "string",
                "enum": ["buy", "sell"],
                "description": "Order side: 'buy' for long positions, 'sell' for short positions"
            },
            "leverage": {
                "type": "integer",
                "minimum": 1,
                "description": "Leverage multiplier. Optional for ISOLATED margin orders; required when closing a position or in CROSS margin."
            },
            "type": {
                "type": "string",
                "enum": ["limit", "market"],
                "description": "Execution type: 'limit' at a specific price, 'market' at best available price",
                "default": "limit"
            },
            "remark": {
                "type": "string",
                "maxLength": 100,
                "description": "Optional order note (max 100 characters)"
            },
            "triggerStopUpPrice": {
                "type": "string",
                "description": "TAKE PROFIT trigger price. Triggers when price rises to this level."
            },
            "stopPriceType": {
                "type": "string",
                "enum": ["TP", "MP", "IP"],
                "description": "Trigger price reference: TP=Trade Price (last), MP=Mark Price (recommended), IP=Index Price"
            },
            "triggerStopDownPrice": {
                "type": "string",
                "description": "STOP LOSS trigger price. Triggers when price falls to this level."
            },
            "reduceOnly": {
                "type": "boolean",
                "description": "Only reduce the existing position; excess size is canceled",
                "default": false
            },
            "closeOrder": {
                "type": "boolean",
                "description": "Close the entire position when triggered. side, size and leverage may be omitted.",
                "default": false
            },
            "forceHold": {
                "type": "boolean",
                "description": "Keep funds frozen for the order even if it reduces the position",
                "default": false
            },
            "stp": {
                "type": "string",
                "enum": ["CN", "CO", "CB"],
                "description": "Self-trade prevention: CN=Cancel Newest, CO=Cancel Oldest, CB=Cancel Both"
            },
            "marginMode": {
                "type": "string",
                "enum": ["ISOLATED", "CROSS"],
                "description": "Margin mode",
                "default": "ISOLATED"
            },
            "price": {
                "type": "string",
                "description": "Limit price (required when type=limit). String to preserve precision."
            },
            "size": {
                "type": "integer",
                "minimum": 1,
                "description": "Order size in lots. Choose exactly ONE of: size, qty, valueQty."
            },
            "qty": {
                "type": "string",
                "description": "Order size in base currency. Must be a multiple of the contract multiplier. Choose exactly ONE of: size, qty, valueQty."
            },
            "valueQty": {
                "type": "string",
                "description": "Order size in quote currency value (USDT/USDC contracts only). Choose exactly ONE of: size, qty, valueQty."
            },
            "timeInForce": {
                "type": "string",
                "enum": ["GTC", "IOC"],
                "description": "GTC=Good Till Canceled, IOC=Immediate or Cancel",
                "default": "GTC"
            },
            "postOnly": {
                "type": "boolean",
                "description": "Maker-only. Not allowed with hidden/iceberg or timeInForce=IOC.",
                "default": false
            },
            "hidden": {
                "type": "boolean",
                "description": "Hide the order from the order book. Not allowed with postOnly.",
                "default": false
            },
            "iceberg": {
                "type": "boolean",
                "description": "Show only part of the order in the book. Requires visibleSize. Not allowed with postOnly.",
                "default": false
            },
            "visibleSize": {
                "type": "string",
                "description": "Maximum visible size for iceberg orders (in lots). Required when iceberg=true."
            },
            "positionSide": {
                "type": "string",
                "enum": ["BOTH", "LONG", "SHORT"],
                "description": "Position direction. Optional in one-way mode (defaults to BOTH), required in hedge mode."
            }
        },
        "required": ["symbol", "side", "leverage", "stopPriceType"],
        "allOf": [
            {
                "anyOf": [
                    { "required": ["triggerStopUpPrice"] },
                    { "required": ["triggerStopDownPrice"] }
                ]
            },
            {
                "oneOf": [
                    { "required": ["size"] },
                    { "required": ["qty"] },
                    { "required": ["valueQty"] }
                ]
            },
            {
                "if": { "properties": { "type": { "const": "limit" } } },
                "then": { "required": ["price"] }
            },
            {
                "if": { "properties": { "iceberg": { "const": true } } },
                "then": { "required": ["visibleSize"] }
            }
        ]
    })
}
