//! Reelcut - natural-language video editing
//!
//! Describe an edit in plain language and an AI agent applies it with ffmpeg.
//!
//! # Overview
//!
//! Reelcut allows you to:
//! - Trim, speed up or slow down, caption and crop videos
//! - Drive those edits from a chat session backed by any OpenAI-compatible model
//! - Expose the same edits to other agents over MCP (stdio) or HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `media` - The edit operations, built on ffmpeg and ffprobe
//! - `tools` - Static tool schemas and typed dispatch into `media`
//! - `mcp` - JSON-RPC tool server and the client that talks to it
//! - `agent` - LLM tool-calling loop
//! - `session` - One video, its edit pointer, and its transcript
//!
//! # Example
//!
//! ```rust,no_run
//! use reelcut::config::Settings;
//! use reelcut::session::Session;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut session = Session::start(settings, Path::new("clip.mp4")).await?;
//!
//!     let report = session.handle_turn("trim it from 2 to 5 seconds").await?;
//!     println!("{}", report.reply);
//!     println!("now editing {}", session.edited_path().display());
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod media;
pub mod openai;
pub mod session;
pub mod tools;

pub use error::{ReelcutError, Result};
