//! Where the agent's tool calls go.

use crate::error::Result;
use crate::mcp::{McpClient, Tool};
use crate::media::EditOutcome;
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use serde_json::Value;

/// A source of editing tools the agent can list and invoke.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Tools to offer the model.
    async fn list_tools(&self) -> Result<Vec<Tool>>;

    /// Invoke a tool by name.
    ///
    /// Argument problems surface as [`crate::ReelcutError::InvalidToolCall`]; a dead
    /// transport as [`crate::ReelcutError::ToolUnreachable`].
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<EditOutcome>;

    /// Release the backend. No-op by default.
    async fn shutdown(&self) {}
}

#[async_trait]
impl ToolBackend for McpClient {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        McpClient::list_tools(self).await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<EditOutcome> {
        McpClient::call_tool(self, name, arguments).await
    }

    async fn shutdown(&self) {
        McpClient::shutdown(self).await
    }
}

/// Runs tools in this process, without a server.
#[async_trait]
impl ToolBackend for ToolRegistry {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        Ok(self.specs().iter().map(Tool::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<EditOutcome> {
        self.call(name, &arguments).await
    }
}
