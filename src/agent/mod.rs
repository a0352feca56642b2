//! Language-model agent that turns editing requests into tool calls.
//!
//! The agent offers the model whatever tools its [`ToolBackend`] lists,
//! executes the calls the model makes, and feeds each outcome back until
//! the model answers in plain text.

mod backend;
mod runner;

pub use backend::ToolBackend;
pub use runner::{function_tools, instruction, Agent, AgentResponse, ToolCallRecord};
