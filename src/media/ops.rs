//! The four edit operations.

use super::naming::{format_factor, output_path, OperationTag};
use super::probe::MediaInfo;
use super::text::{drawtext_filter, validate_color, FontSource, TextPosition};
use super::EditOutcome;
use crate::config::Settings;
use crate::error::{ReelcutError, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Runs edit operations against ffmpeg, writing into one outputs directory.
#[derive(Debug, Clone)]
pub struct MediaEngine {
    ffmpeg: String,
    ffprobe: String,
    font: String,
    font_file: Option<PathBuf>,
    video_codec: String,
    audio_codec: String,
    outputs_dir: PathBuf,
}

impl MediaEngine {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ffmpeg: settings.media.ffmpeg.clone(),
            ffprobe: settings.media.ffprobe.clone(),
            font: settings.media.font.clone(),
            font_file: settings
                .media
                .font_file
                .as_deref()
                .map(Settings::expand_path),
            video_codec: settings.media.video_codec.clone(),
            audio_codec: settings.media.audio_codec.clone(),
            outputs_dir: settings.outputs_dir(),
        }
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs_dir
    }

    /// Keep `[start, end)` seconds of the source.
    #[instrument(skip(self, input), fields(input = %input.display()))]
    pub async fn trim(&self, input: &Path, start: i64, end: i64) -> EditOutcome {
        let output = output_path(&self.outputs_dir, input, &OperationTag::Trim { start, end });
        let result = self.run_trim(input, start, end, &output).await;
        self.finish(result, output, "Video successfully trimmed", "Error trimming video")
    }

    /// Scale the timeline by `1 / factor`.
    #[instrument(skip(self, input), fields(input = %input.display()))]
    pub async fn change_speed(&self, input: &Path, factor: f64) -> EditOutcome {
        let output = output_path(&self.outputs_dir, input, &OperationTag::Speed { factor });
        let result = self.run_change_speed(input, factor, &output).await;
        self.finish(result, output, "Video speed changed", "Error changing video speed")
    }

    /// Burn a static label onto every frame.
    #[instrument(skip(self, input, text), fields(input = %input.display()))]
    pub async fn add_text_overlay(
        &self,
        input: &Path,
        text: &str,
        fontsize: u32,
        color: &str,
        position: TextPosition,
    ) -> EditOutcome {
        let tag = OperationTag::TextOverlay {
            text: text.to_string(),
            fontsize,
            color: color.to_string(),
            position,
        };
        let output = output_path(&self.outputs_dir, input, &tag);
        let result = self
            .run_text_overlay(input, text, fontsize, color, position, &output)
            .await;
        self.finish(result, output, "Text overlay added", "Error adding text overlay")
    }

    /// Keep the pixel rectangle from (x1, y1) to (x2, y2).
    #[instrument(skip(self, input), fields(input = %input.display()))]
    pub async fn crop(&self, input: &Path, x1: i64, y1: i64, x2: i64, y2: i64) -> EditOutcome {
        let output = output_path(&self.outputs_dir, input, &OperationTag::Crop { x1, y1, x2, y2 });
        let result = self.run_crop(input, x1, y1, x2, y2, &output).await;
        self.finish(result, output, "Video successfully cropped", "Error cropping video")
    }

    async fn run_trim(&self, input: &Path, start: i64, end: i64, output: &Path) -> Result<NamedTempFile> {
        if start < 0 {
            return Err(ReelcutError::InvalidParameters(format!(
                "start time {}s is negative",
                start
            )));
        }
        if start >= end {
            return Err(ReelcutError::InvalidParameters(format!(
                "start time {}s must be before end time {}s",
                start, end
            )));
        }

        let info = self.probe(input).await?;
        if start as f64 >= info.duration_seconds {
            return Err(ReelcutError::InvalidParameters(format!(
                "start time {}s is beyond the video duration ({:.2}s)",
                start, info.duration_seconds
            )));
        }
        if end as f64 > info.duration_seconds {
            debug!("End {}s past duration {:.2}s, output ends at source end", end, info.duration_seconds);
        }

        let rendered = self.render_target(output).await?;
        self.run_ffmpeg(vec![
            "-ss".into(),
            start.to_string().into(),
            "-i".into(),
            input.into(),
            "-t".into(),
            (end - start).to_string().into(),
            rendered.path().into(),
        ])
        .await?;
        Ok(rendered)
    }

    async fn run_change_speed(&self, input: &Path, factor: f64, output: &Path) -> Result<NamedTempFile> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ReelcutError::InvalidParameters(format!(
                "speed factor must be greater than 0, got {}",
                factor
            )));
        }

        let info = self.probe(input).await?;
        let rendered = self.render_target(output).await?;

        let mut args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-filter:v".into(),
            format!("setpts={}*PTS", format_factor(1.0 / factor)).into(),
        ];
        if info.has_audio {
            args.push("-filter:a".into());
            args.push(atempo_chain(factor).into());
        }
        args.push(rendered.path().into());

        self.run_ffmpeg(args).await?;
        Ok(rendered)
    }

    async fn run_text_overlay(
        &self,
        input: &Path,
        text: &str,
        fontsize: u32,
        color: &str,
        position: TextPosition,
        output: &Path,
    ) -> Result<NamedTempFile> {
        if text.trim().is_empty() {
            return Err(ReelcutError::InvalidParameters("overlay text is empty".into()));
        }
        if fontsize == 0 {
            return Err(ReelcutError::InvalidParameters("font size must be positive".into()));
        }
        validate_color(color)?;

        let info = self.probe(input).await?;
        info.dimensions()?;
        let rendered = self.render_target(output).await?;

        // Both scratch files are removed when they go out of scope,
        // whichever way this function returns.
        let mut label = tempfile::Builder::new()
            .prefix("reelcut-label-")
            .suffix(".txt")
            .tempfile_in(&self.outputs_dir)?;
        label.write_all(text.as_bytes())?;
        label.flush()?;

        let audio = if info.has_audio {
            let temp_audio = tempfile::Builder::new()
                .prefix("reelcut-audio-")
                .suffix(".m4a")
                .tempfile_in(&self.outputs_dir)?;
            debug!("Extracting audio to {}", temp_audio.path().display());
            self.run_ffmpeg(vec![
                "-i".into(),
                input.into(),
                "-vn".into(),
                "-c:a".into(),
                self.audio_codec.clone().into(),
                temp_audio.path().into(),
            ])
            .await?;
            Some(temp_audio)
        } else {
            None
        };

        let font = match &self.font_file {
            Some(path) => FontSource::File(path),
            None => FontSource::Family(&self.font),
        };
        let filter = drawtext_filter(label.path(), font, fontsize, color, position);

        let mut args: Vec<OsString> = vec!["-i".into(), input.into()];
        if let Some(temp_audio) = &audio {
            args.push("-i".into());
            args.push(temp_audio.path().into());
        }
        args.push("-map".into());
        args.push("0:v:0".into());
        if audio.is_some() {
            args.push("-map".into());
            args.push("1:a:0".into());
        }
        args.push("-vf".into());
        args.push(filter.into());
        args.push("-c:v".into());
        args.push(self.video_codec.clone().into());
        if audio.is_some() {
            args.push("-c:a".into());
            args.push(self.audio_codec.clone().into());
        }
        args.push(rendered.path().into());

        self.run_ffmpeg(args).await?;
        Ok(rendered)
    }

    async fn run_crop(
        &self,
        input: &Path,
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        output: &Path,
    ) -> Result<NamedTempFile> {
        let rect = format!("({}, {}) to ({}, {})", x1, y1, x2, y2);
        let (width, height) = match (x2.checked_sub(x1), y2.checked_sub(y1)) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(ReelcutError::InvalidParameters(format!(
                    "crop rectangle {} is out of range",
                    rect
                )))
            }
        };
        if width <= 0 || height <= 0 {
            return Err(ReelcutError::InvalidParameters(format!(
                "crop rectangle {} is empty ({}x{})",
                rect, width, height
            )));
        }

        let (frame_w, frame_h) = self.probe(input).await?.dimensions()?;
        if x1 < 0 || y1 < 0 || x2 > i64::from(frame_w) || y2 > i64::from(frame_h) {
            return Err(ReelcutError::InvalidParameters(format!(
                "crop rectangle {} is outside the {}x{} frame",
                rect, frame_w, frame_h
            )));
        }

        let rendered = self.render_target(output).await?;
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-vf".into(),
            format!("crop=w={}:h={}:x={}:y={}:exact=1", width, height, x1, y1).into(),
            "-c:v".into(),
            self.video_codec.clone().into(),
        ];
        // 4:2:0 chroma cannot hold an odd width or height.
        if width % 2 != 0 || height % 2 != 0 {
            args.push("-pix_fmt".into());
            args.push("yuv444p".into());
        }
        args.push("-c:a".into());
        args.push("copy".into());
        args.push(rendered.path().into());
        self.run_ffmpeg(args).await?;

        let written = self.probe(rendered.path()).await?.dimensions()?;
        if written != (width as u32, height as u32) {
            return Err(ReelcutError::ToolFailed(format!(
                "ffmpeg wrote a {}x{} frame instead of {}x{}",
                written.0, written.1, width, height
            )));
        }
        Ok(rendered)
    }

    async fn probe(&self, input: &Path) -> Result<MediaInfo> {
        MediaInfo::probe(&self.ffprobe, input).await
    }

    /// Scratch file ffmpeg writes into. It only replaces `output` once
    /// the render has succeeded, and is removed on drop otherwise.
    async fn render_target(&self, output: &Path) -> Result<NamedTempFile> {
        tokio::fs::create_dir_all(&self.outputs_dir).await?;
        let suffix = output
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let rendered = tempfile::Builder::new()
            .prefix("reelcut-render-")
            .suffix(&suffix)
            .tempfile_in(&self.outputs_dir)?;
        Ok(rendered)
    }

    /// Run ffmpeg with overwrite and quiet logging.
    async fn run_ffmpeg(&self, args: Vec<OsString>) -> Result<()> {
        debug!("ffmpeg {:?}", args);

        let result = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-loglevel").arg("error")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(ReelcutError::ToolFailed(format!("ffmpeg failed: {}", err.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReelcutError::ToolNotFound(self.ffmpeg.clone()))
            }
            Err(e) => Err(ReelcutError::ToolFailed(format!("ffmpeg error: {e}"))),
        }
    }

    /// Turn an internal result into the outcome reported to the agent.
    ///
    /// A failed edit never touches an existing file at `output`.
    fn finish(
        &self,
        result: Result<NamedTempFile>,
        output: PathBuf,
        success_text: &str,
        error_text: &str,
    ) -> EditOutcome {
        let rendered = match result {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("{}: {}", error_text, e);
                return EditOutcome::failure(format!("{}: {}", error_text, e));
            }
        };

        let written = std::fs::metadata(rendered.path())
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !written {
            return EditOutcome::failure(format!(
                "{}: ffmpeg finished but {} was not written",
                error_text,
                output.display()
            ));
        }

        match rendered.persist(&output) {
            Ok(_) => {
                info!("Created {}", output.display());
                let message = format!("{}. New video saved at: {}", success_text, output.display());
                EditOutcome::success(output, message)
            }
            Err(e) => {
                warn!("Could not move render into {}: {}", output.display(), e.error);
                EditOutcome::failure(format!(
                    "{}: could not save {}: {}",
                    error_text,
                    output.display(),
                    e.error
                ))
            }
        }
    }
}

/// ffmpeg's atempo only accepts 0.5..=2.0 per stage, so larger changes are chained.
fn atempo_chain(factor: f64) -> String {
    let mut stages = Vec::new();
    let mut remaining = factor;

    while remaining > 2.0 {
        stages.push(2.0);
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        stages.push(0.5);
        remaining /= 0.5;
    }
    stages.push(remaining);

    stages
        .iter()
        .map(|s| format!("atempo={}", format_factor(*s)))
        .collect::<Vec<_>>()
        .join(",")
}
