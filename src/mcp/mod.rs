//! MCP Protocol Layer
//!
//! JSON-RPC 2.0 handling for the Model Context Protocol:
//! - Wire types and error codes
//! - Argument normalization for the different client wrappers
//! - The static tool catalog and typed tool calls
//! - Method dispatch and response formatting

pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod jsonrpc;
pub mod normalize;
pub mod tools;

pub use dispatcher::{ConnectorFactory, Dispatcher, Reply, Transport};
pub use error::{DispatchError, DispatchResult};
pub use format::ResponseFormat;
pub use tools::{ToolCall, ToolName};
