//! Typed tool calls and dispatch into the media library.

use super::spec::{ParamKind, ToolSpec, TOOL_SPECS};
use crate::error::{ReelcutError, Result};
use crate::media::{EditOutcome, MediaEngine, TextPosition};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;

/// A parsed request for one editing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Trim {
        video_path: PathBuf,
        start_time: i64,
        end_time: i64,
    },
    ChangeSpeed {
        video_path: PathBuf,
        speed_factor: f64,
    },
    AddTextOverlay {
        video_path: PathBuf,
        text: String,
        fontsize: u32,
        color: String,
        position: String,
    },
    Crop {
        video_path: PathBuf,
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
    },
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::Trim { .. } => "trim_video",
            ToolCall::ChangeSpeed { .. } => "change_speed",
            ToolCall::AddTextOverlay { .. } => "add_text_overlay",
            ToolCall::Crop { .. } => "crop_video",
        }
    }
}

/// Maps tool names to operations on a [`MediaEngine`].
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    engine: MediaEngine,
}

impl ToolRegistry {
    pub fn new(engine: MediaEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &MediaEngine {
        &self.engine
    }

    /// Declared schemas, in registration order.
    pub fn specs(&self) -> &'static [ToolSpec] {
        TOOL_SPECS
    }

    pub fn get(&self, name: &str) -> Option<&'static ToolSpec> {
        TOOL_SPECS.iter().find(|spec| spec.name == name)
    }

    /// Name and description of every tool.
    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        TOOL_SPECS.iter().map(|s| (s.name, s.description)).collect()
    }

    /// Run a parsed call. Media failures come back as failure outcomes.
    pub async fn execute(&self, call: &ToolCall) -> EditOutcome {
        info!("Executing tool: {}", call.name());

        match call {
            ToolCall::Trim {
                video_path,
                start_time,
                end_time,
            } => self.engine.trim(video_path, *start_time, *end_time).await,
            ToolCall::ChangeSpeed {
                video_path,
                speed_factor,
            } => self.engine.change_speed(video_path, *speed_factor).await,
            ToolCall::AddTextOverlay {
                video_path,
                text,
                fontsize,
                color,
                position,
            } => match position.parse::<TextPosition>() {
                Ok(position) => {
                    self.engine
                        .add_text_overlay(video_path, text, *fontsize, color, position)
                        .await
                }
                Err(e) => EditOutcome::failure(format!("Error adding text overlay: {}", e)),
            },
            ToolCall::Crop {
                video_path,
                x1,
                y1,
                x2,
                y2,
            } => self.engine.crop(video_path, *x1, *y1, *x2, *y2).await,
        }
    }

    /// Parse and run in one step.
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<EditOutcome> {
        let call = parse_tool_call(name, arguments)?;
        Ok(self.execute(&call).await)
    }
}

/// Build a typed call from a tool name and JSON arguments.
pub fn parse_tool_call(name: &str, arguments: &Value) -> Result<ToolCall> {
    let spec = TOOL_SPECS
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| ReelcutError::InvalidToolCall(format!("Unknown tool: {}", name)))?;

    let empty = Map::new();
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(ReelcutError::InvalidToolCall(format!(
                "arguments for '{}' must be an object, got {}",
                name, other
            )))
        }
    };

    let args = Args { spec, args };

    match name {
        "trim_video" => Ok(ToolCall::Trim {
            video_path: args.path("video_path")?,
            start_time: args.int("start_time")?,
            end_time: args.int("end_time")?,
        }),
        "change_speed" => Ok(ToolCall::ChangeSpeed {
            video_path: args.path("video_path")?,
            speed_factor: args.number("speed_factor")?,
        }),
        "add_text_overlay" => {
            let fontsize = args.int("fontsize")?;
            Ok(ToolCall::AddTextOverlay {
                video_path: args.path("video_path")?,
                text: args.string("text")?,
                fontsize: u32::try_from(fontsize).map_err(|_| {
                    ReelcutError::InvalidToolCall(format!("fontsize {} out of range", fontsize))
                })?,
                color: args.string("color")?,
                position: args.string("position")?,
            })
        }
        "crop_video" => Ok(ToolCall::Crop {
            video_path: args.path("video_path")?,
            x1: args.int("x1")?,
            y1: args.int("y1")?,
            x2: args.int("x2")?,
            y2: args.int("y2")?,
        }),
        _ => Err(ReelcutError::InvalidToolCall(format!("Unknown tool: {}", name))),
    }
}

/// Argument lookup that falls back to declared defaults.
struct Args<'a> {
    spec: &'static ToolSpec,
    args: &'a Map<String, Value>,
}

impl Args<'_> {
    fn value(&self, key: &str) -> Result<Value> {
        if let Some(v) = self.args.get(key).filter(|v| !v.is_null()) {
            return Ok(v.clone());
        }
        self.spec
            .param(key)
            .and_then(|p| p.default_value())
            .ok_or_else(|| ReelcutError::InvalidToolCall(format!("Missing '{}' argument", key)))
    }

    fn mistyped(&self, key: &str, kind: ParamKind, got: &Value) -> ReelcutError {
        ReelcutError::InvalidToolCall(format!(
            "'{}' must be {:?}, got {}",
            key, kind, got
        ))
    }

    fn string(&self, key: &str) -> Result<String> {
        match self.value(key)? {
            Value::String(s) => Ok(s),
            // Positions sometimes arrive as ["center", "top"].
            Value::Array(items) => Ok(items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(",")),
            other => Err(self.mistyped(key, ParamKind::String, &other)),
        }
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        self.string(key).map(PathBuf::from)
    }

    /// Integers, integral floats, and numeric strings are all accepted.
    /// Floats outside the i64 range are rejected rather than saturated.
    fn int(&self, key: &str) -> Result<i64> {
        let value = self.value(key)?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.mistyped(key, ParamKind::Integer, &value))
    }

    fn number(&self, key: &str) -> Result<f64> {
        let value = self.value(key)?;
        let parsed = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches(['x', 'X']).parse::<f64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.mistyped(key, ParamKind::Number, &value))
    }
}
