//! JSON-RPC 2.0 plumbing for the MCP server side: wire types, the method handler and the
//! newline-delimited stdio loop.

mod handler;
mod server;
pub mod types;

pub use handler::{McpHandler, ServerInfo};
pub use server::{ServeError, serve, serve_stdio};
pub use types::{RpcError, RpcErrorData, RpcRequest, RpcResponse};
