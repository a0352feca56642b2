//! Media operation library.
//!
//! Thin, parameterized transformations of one video file into another,
//! implemented by shelling out to ffmpeg and ffprobe. Every operation
//! reports an [`EditOutcome`] instead of propagating errors: the caller is a
//! text-reporting agent, and failures are part of the conversation.

mod naming;
mod ops;
mod probe;
mod text;

pub use naming::{format_factor, output_path, OperationTag};
pub use ops::MediaEngine;
pub use probe::MediaInfo;
pub use text::{HorizontalAlign, TextPosition, VerticalAlign};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Whether an edit produced a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditStatus {
    Success,
    Failure,
}

/// Result of a single edit operation.
///
/// `output_path` is only set on success. `message` is the human-readable
/// rendering: success messages embed the output path, failure messages start
/// with `Error `.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub status: EditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub message: String,
}

impl EditOutcome {
    pub fn success(output_path: PathBuf, message: String) -> Self {
        Self {
            status: EditStatus::Success,
            output_path: Some(output_path),
            message,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            status: EditStatus::Failure,
            output_path: None,
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EditStatus::Success
    }

    /// The output path, but only if the file is actually on disk right now.
    pub fn verified_output(&self) -> Option<&Path> {
        match (&self.status, &self.output_path) {
            (EditStatus::Success, Some(path)) if path.exists() => Some(path.as_path()),
            _ => None,
        }
    }
}

impl std::fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
