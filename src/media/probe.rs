//! ffprobe-based media inspection.

use crate::error::{ReelcutError, Result};
use serde_json::Value;
use std::path::Path;
use tokio::process::Command;

/// Properties re-derived from the file on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub duration_seconds: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub has_audio: bool,
}

impl MediaInfo {
    /// Probe a file with ffprobe's JSON output.
    pub async fn probe(ffprobe: &str, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReelcutError::Media(format!(
                "input video not found: {}",
                path.display()
            )));
        }

        let result = Command::new(ffprobe)
            .arg("-v").arg("quiet")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(path)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReelcutError::ToolNotFound(ffprobe.to_string()));
            }
            Err(e) => {
                return Err(ReelcutError::ToolFailed(format!("ffprobe failed: {e}")));
            }
        };

        if !output.status.success() {
            return Err(ReelcutError::Media(format!(
                "could not read video: {}",
                path.display()
            )));
        }

        let parsed: Value = serde_json::from_slice(&output.stdout)
            .map_err(|_| ReelcutError::Media("invalid ffprobe output".into()))?;

        Self::from_probe_json(&parsed)
    }

    /// Extract the fields we care about from ffprobe JSON.
    pub fn from_probe_json(json: &Value) -> Result<Self> {
        let duration_seconds = json["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| ReelcutError::Media("could not determine video duration".into()))?;

        let streams = json["streams"].as_array().map(Vec::as_slice).unwrap_or(&[]);

        let video = streams.iter().find(|s| s["codec_type"] == "video");
        let dimension = |key: &str| {
            video
                .and_then(|s| s[key].as_u64())
                .and_then(|v| u32::try_from(v).ok())
        };

        Ok(Self {
            duration_seconds,
            width: dimension("width"),
            height: dimension("height"),
            has_audio: streams.iter().any(|s| s["codec_type"] == "audio"),
        })
    }

    /// Frame size, or an error for files without a video stream.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(ReelcutError::Media("input has no video stream".into())),
        }
    }
}
