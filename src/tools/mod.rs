//! Tool registry: the editing operations offered to the agent.
//!
//! Schemas are declared explicitly in a static table. The same table feeds
//! the MCP `tools/list` response, the HTTP API, and the OpenAI function
//! definitions, so every surface advertises exactly the same operations.

mod registry;
mod spec;

pub use registry::{parse_tool_call, ToolCall, ToolRegistry};
pub use spec::{ParamKind, ParamSpec, ToolSpec, TOOL_SPECS};
