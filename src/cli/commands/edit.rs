//! Direct edits without the agent.

use crate::cli::preflight::{self, Operation};
use crate::cli::{EditOperation, Output};
use crate::config::Settings;
use crate::media::MediaEngine;
use crate::tools::{ToolCall, ToolRegistry};
use anyhow::Result;
use std::path::Path;

/// Apply one operation to `video` and report the outcome.
///
/// A failed edit exits with status 1 after printing its message.
pub async fn run_edit(
    video: &Path,
    operation: &EditOperation,
    json: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Edit, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'reelcut doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let registry = ToolRegistry::new(MediaEngine::new(&settings));
    let call = to_tool_call(video, operation);

    let spinner = (!json).then(|| Output::spinner(&format!("Running {}...", call.name())));
    let outcome = registry.execute(&call).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        Output::outcome(&outcome);
    }

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn to_tool_call(video: &Path, operation: &EditOperation) -> ToolCall {
    let video_path = video.to_path_buf();
    match operation {
        EditOperation::Trim { start, end } => ToolCall::Trim {
            video_path,
            start_time: *start,
            end_time: *end,
        },
        EditOperation::Speed { factor } => ToolCall::ChangeSpeed {
            video_path,
            speed_factor: *factor,
        },
        EditOperation::Text {
            text,
            fontsize,
            color,
            position,
        } => ToolCall::AddTextOverlay {
            video_path,
            text: text.clone(),
            fontsize: *fontsize,
            color: color.clone(),
            position: position.clone(),
        },
        EditOperation::Crop { x1, y1, x2, y2 } => ToolCall::Crop {
            video_path,
            x1: *x1,
            y1: *y1,
            x2: *x2,
            y2: *y2,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_tool_call() {
        let call = to_tool_call(
            Path::new("clip.mp4"),
            &EditOperation::Speed { factor: 2.0 },
        );
        assert_eq!(call.name(), "change_speed");
        assert!(matches!(call, ToolCall::ChangeSpeed { speed_factor, .. } if speed_factor == 2.0));
    }
}
