//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{ReelcutError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Editing requires ffmpeg and ffprobe.
    Edit,
    /// Chat requires the editing tools and an API key.
    Chat,
    /// Listing tools has no requirements.
    Tools,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Edit => {
            check_tool(&settings.media.ffmpeg)?;
            check_tool(&settings.media.ffprobe)?;
        }
        Operation::Chat => {
            check_api_key(settings)?;
            check_tool(&settings.media.ffmpeg)?;
            check_tool(&settings.media.ffprobe)?;
        }
        Operation::Tools => {}
    }
    Ok(())
}

/// Check that the agent's API key is set.
pub fn check_api_key(settings: &Settings) -> Result<()> {
    let var = &settings.agent.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(ReelcutError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(ReelcutError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ReelcutError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ReelcutError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ReelcutError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
