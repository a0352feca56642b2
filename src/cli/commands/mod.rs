//! CLI command implementations.

mod chat;
mod config;
mod doctor;
mod edit;
mod mcp;
mod serve;
mod tools;

pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use edit::run_edit;
pub use mcp::run_mcp;
pub use serve::run_serve;
pub use tools::run_tools;
