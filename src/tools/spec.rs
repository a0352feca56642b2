//! Declared tool schemas.

use serde_json::{json, Map, Value};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Integer,
    Number,
    String,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::String => "string",
        }
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    /// JSON literal for the default; None means the parameter is required.
    pub default: Option<&'static str>,
}

impl ParamSpec {
    const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            default: None,
        }
    }

    const fn optional(
        name: &'static str,
        kind: ParamKind,
        description: &'static str,
        default: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            description,
            default: Some(default),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn default_value(&self) -> Option<Value> {
        self.default.and_then(|d| serde_json::from_str(d).ok())
    }
}

/// A named, schema-described operation.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolSpec {
    /// JSON Schema object for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            let mut prop = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            if let Some(default) = param.default_value() {
                prop["default"] = default;
            }
            properties.insert(param.name.to_string(), prop);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

const VIDEO_PATH: ParamSpec = ParamSpec::required(
    "video_path",
    ParamKind::String,
    "Path of the video to edit",
);

/// Every operation the agent may call.
pub static TOOL_SPECS: &[ToolSpec] = &[
    ToolSpec {
        name: "trim_video",
        description: "Trims a video from a start time to an end time (whole seconds). \
            Returns the path of the new video.",
        params: &[
            VIDEO_PATH,
            ParamSpec::required("start_time", ParamKind::Integer, "Start time in seconds"),
            ParamSpec::required("end_time", ParamKind::Integer, "End time in seconds"),
        ],
    },
    ToolSpec {
        name: "change_speed",
        description: "Changes the speed of a video by a given factor. \
            Factor > 1 for fast-forward, < 1 for slow-motion.",
        params: &[
            VIDEO_PATH,
            ParamSpec::required(
                "speed_factor",
                ParamKind::Number,
                "Speed multiplier, e.g. 2.0 for twice as fast",
            ),
        ],
    },
    ToolSpec {
        name: "add_text_overlay",
        description: "Adds a static text overlay to every frame of a video.",
        params: &[
            VIDEO_PATH,
            ParamSpec::required("text", ParamKind::String, "Text to display"),
            ParamSpec::optional("fontsize", ParamKind::Integer, "Font size in pixels", "24"),
            ParamSpec::optional("color", ParamKind::String, "Text color name or #RRGGBB", "\"white\""),
            ParamSpec::optional(
                "position",
                ParamKind::String,
                "Anchor: center, top, bottom, left, right, top-left, top-right, bottom-left, bottom-right",
                "\"center\"",
            ),
        ],
    },
    ToolSpec {
        name: "crop_video",
        description: "Crops a video to the rectangle from (x1, y1) to (x2, y2) in pixels.",
        params: &[
            VIDEO_PATH,
            ParamSpec::required("x1", ParamKind::Integer, "Left edge"),
            ParamSpec::required("y1", ParamKind::Integer, "Top edge"),
            ParamSpec::required("x2", ParamKind::Integer, "Right edge"),
            ParamSpec::required("y2", ParamKind::Integer, "Bottom edge"),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names() {
        let names: Vec<_> = TOOL_SPECS.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["trim_video", "change_speed", "add_text_overlay", "crop_video"]
        );
    }

    #[test]
    fn test_overlay_schema_defaults() {
        let spec = TOOL_SPECS.iter().find(|t| t.name == "add_text_overlay").unwrap();
        let schema = spec.input_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["fontsize"]["default"], 24);
        assert_eq!(schema["properties"]["color"]["default"], "white");
        assert_eq!(schema["properties"]["position"]["type"], "string");
        assert_eq!(schema["required"], json!(["video_path", "text"]));
    }

    #[test]
    fn test_all_defaults_parse() {
        for spec in TOOL_SPECS {
            for param in spec.params {
                if param.default.is_some() {
                    assert!(param.default_value().is_some(), "{}.{}", spec.name, param.name);
                }
            }
        }
    }
}
