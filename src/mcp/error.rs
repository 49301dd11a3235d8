//! Dispatch errors and their JSON-RPC codes.

use thiserror::Error;

use crate::connectors::ConnectorError;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
/// Generic tool execution failure
pub const EXECUTION_ERROR: i64 = -1;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Parse error")]
    Parse,

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments could not be turned into an exchange call
    #[error("{0}")]
    Arguments(String),

    #[error("{0}")]
    Tool(#[from] ConnectorError),
}

impl DispatchError {
    pub fn code(&self) -> i64 {
        match self {
            DispatchError::Parse => PARSE_ERROR,
            DispatchError::MethodNotFound(_) => METHOD_NOT_FOUND,
            DispatchError::InvalidParams(_) => INVALID_PARAMS,
            DispatchError::UnknownTool(_) | DispatchError::Arguments(_) | DispatchError::Tool(_) => EXECUTION_ERROR,
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
