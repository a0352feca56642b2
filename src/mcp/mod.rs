//! MCP (Model Context Protocol) tool server and client.
//!
//! The server exposes the editing tools over JSON-RPC 2.0 on stdio; the
//! client spawns it as a child process, one per session.

mod client;
mod protocol;
mod server;

pub use client::{McpClient, ServerCommand};
pub use protocol::{Tool, ToolCallResult};
pub use server::McpServer;
