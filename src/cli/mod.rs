//! CLI module for Reelcut.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reelcut - edit videos by asking for it
///
/// Describe an edit in plain language ("trim from 5 to 10 seconds", "make it
/// twice as fast") and an AI agent applies it with ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "reelcut")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "REELCUT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive editing session for a video
    Chat {
        /// Video file to edit (copied into the workspace)
        video: PathBuf,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Run tools in this process instead of a tool server
        #[arg(long)]
        in_process: bool,
    },

    /// Apply a single edit directly, without the agent
    Edit {
        /// Input video
        video: PathBuf,

        /// Print the outcome as JSON
        #[arg(long, global = true)]
        json: bool,

        #[command(subcommand)]
        operation: EditOperation,
    },

    /// List the editing tools and their parameters
    Tools {
        /// Print the tool list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the MCP tool server on stdio
    Mcp,

    /// Start the HTTP tool server
    Serve {
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum EditOperation {
    /// Keep the segment between two times
    Trim {
        /// Start time in whole seconds
        start: i64,
        /// End time in whole seconds
        end: i64,
    },

    /// Change playback speed (2.0 = twice as fast)
    Speed {
        factor: f64,
    },

    /// Burn a text label into every frame
    Text {
        text: String,

        #[arg(long, default_value = "24")]
        fontsize: u32,

        #[arg(long, default_value = "white")]
        color: String,

        /// e.g. center, top-left, bottom-right
        #[arg(long, default_value = "center")]
        position: String,
    },

    /// Keep the rectangle (x1, y1)-(x2, y2)
    Crop {
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit_crop() {
        let cli = Cli::try_parse_from(["reelcut", "edit", "clip.mp4", "crop", "0", "0", "100", "80"]).unwrap();
        match cli.command {
            Commands::Edit { video, json, operation } => {
                assert_eq!(video, PathBuf::from("clip.mp4"));
                assert!(!json);
                assert!(matches!(operation, EditOperation::Crop { x2: 100, y2: 80, .. }));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_text_defaults() {
        let cli = Cli::try_parse_from(["reelcut", "edit", "clip.mp4", "text", "Hello"]).unwrap();
        match cli.command {
            Commands::Edit {
                operation: EditOperation::Text { fontsize, color, position, .. },
                ..
            } => {
                assert_eq!(fontsize, 24);
                assert_eq!(color, "white");
                assert_eq!(position, "center");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
