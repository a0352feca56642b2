//! Tools command - list the editing tools.

use crate::cli::Output;
use crate::mcp::Tool;
use crate::tools::{ParamSpec, TOOL_SPECS};
use anyhow::Result;

/// Print every tool with its parameters.
pub fn run_tools(json: bool) -> Result<()> {
    if json {
        let tools: Vec<Tool> = TOOL_SPECS.iter().map(Tool::from).collect();
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    Output::header("Editing Tools");
    println!();
    for spec in TOOL_SPECS {
        let params: Vec<String> = spec.params.iter().map(signature).collect();
        Output::tool(spec.name, &params, spec.description);
    }
    println!();
    Ok(())
}

fn signature(param: &ParamSpec) -> String {
    match param.default {
        Some(default) => format!("{}={}", param.name, default),
        None => param.name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_shows_defaults() {
        let overlay = TOOL_SPECS.iter().find(|s| s.name == "add_text_overlay").unwrap();
        let params: Vec<String> = overlay.params.iter().map(signature).collect();
        assert!(params.contains(&"video_path".to_string()));
        assert!(params.contains(&"fontsize=24".to_string()));
        assert!(params.contains(&"color=\"white\"".to_string()));
    }
}
