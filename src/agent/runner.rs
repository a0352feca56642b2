//! Agent runner with tool calling loop.

use super::backend::ToolBackend;
use crate::config::Settings;
use crate::error::{ReelcutError, Result};
use crate::mcp::Tool;
use crate::media::EditOutcome;
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObject,
};
use async_openai::Client;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default system prompt for the editing agent.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a video editing assistant.

You edit the user's current video with the tools you are given: trim_video, change_speed, add_text_overlay and crop_video.
Always pass the current video path exactly as given as the video_path argument.
Times are whole seconds; crop coordinates are pixels from the top-left corner.

Make at most one edit per request unless the user clearly asks for several.
When a tool succeeds, tell the user what changed and repeat the saved path verbatim.
When a tool fails, explain the error briefly and suggest valid values."#;

/// Agent that turns a request into tool calls against a [`ToolBackend`].
pub struct Agent {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    backend: Arc<dyn ToolBackend>,
    tools: Vec<ChatCompletionTool>,
    max_iterations: usize,
    system_prompt: String,
}

impl Agent {
    /// Create an agent offering exactly the backend's current tool list.
    pub async fn connect(settings: &Settings, backend: Arc<dyn ToolBackend>) -> Result<Self> {
        let client = create_client(settings)?;
        let listed = backend.list_tools().await?;
        info!("Agent ready with {} tools", listed.len());

        Ok(Self {
            client,
            model: settings.agent.model.clone(),
            temperature: settings.agent.temperature,
            backend,
            tools: function_tools(&listed),
            max_iterations: settings.agent.max_iterations.max(1),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        })
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of the tools offered to the model.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.function.name.as_str()).collect()
    }

    /// Run one editing request against the given video.
    pub async fn edit(&self, video: &Path, prompt: &str) -> Result<AgentResponse> {
        self.run(&instruction(video, prompt)).await
    }

    /// Run the agent with a user task.
    ///
    /// Returns [`ReelcutError::ToolUnreachable`] as soon as the backend does.
    #[instrument(skip(self, task), fields(model = %self.model))]
    pub async fn run(&self, task: &str) -> Result<AgentResponse> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| ReelcutError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(task.to_string())
                .build()
                .map_err(|e| ReelcutError::Agent(e.to_string()))?
                .into(),
        ];

        let mut tool_calls_made = Vec::new();

        for iteration in 1..=self.max_iterations {
            debug!("Agent iteration {}", iteration);

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages.clone())
                .tools(self.tools.clone())
                .temperature(self.temperature)
                .build()
                .map_err(|e| ReelcutError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| ReelcutError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| ReelcutError::Agent("No response from model".to_string()))?;

            let tool_calls = match &choice.message.tool_calls {
                Some(calls) if !calls.is_empty() => calls,
                _ => {
                    return Ok(build_response(
                        choice.message.content.as_deref(),
                        tool_calls_made,
                        iteration,
                    ))
                }
            };

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| ReelcutError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in tool_calls {
                let record = self.execute_tool_call(tool_call).await?;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.outcome.message.clone())
                    .build()
                    .map_err(|e| ReelcutError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                tool_calls_made.push(record);
            }
        }

        if tool_calls_made.is_empty() {
            return Err(ReelcutError::Agent(format!(
                "Agent exceeded maximum iterations ({})",
                self.max_iterations
            )));
        }

        warn!(
            "Agent stopped after {} iterations, reporting the last tool result",
            self.max_iterations
        );
        Ok(build_response(None, tool_calls_made, self.max_iterations))
    }

    /// Execute a single tool call. Only an unreachable backend is an error.
    async fn execute_tool_call(
        &self,
        tool_call: &ChatCompletionMessageToolCall,
    ) -> Result<ToolCallRecord> {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let outcome = match parse_arguments(arguments) {
            Ok(args) => match self.backend.call_tool(name, args).await {
                Ok(outcome) => outcome,
                Err(e @ ReelcutError::ToolUnreachable(_)) => return Err(e),
                Err(e) => EditOutcome::failure(format!("Tool error: {}", e)),
            },
            Err(e) => EditOutcome::failure(format!("Failed to parse tool call: {}", e)),
        };

        debug!("Tool {} -> {}", name, outcome);

        Ok(ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            outcome,
        })
    }
}

/// The user message for one request: the current video path plus the request.
pub fn instruction(video: &Path, prompt: &str) -> String {
    format!(
        "The current video is at {}. The user wants to: {}",
        video.display(),
        prompt
    )
}

/// Convert listed tools to chat-completion function definitions.
pub fn function_tools(tools: &[Tool]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.input_schema.clone()),
                strict: None,
            },
        })
        .collect()
}

fn parse_arguments(arguments: &str) -> Result<Value> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(arguments)?)
}

/// Final reply: the model's text, or the last tool message when it gave none.
fn build_response(
    content: Option<&str>,
    tool_calls: Vec<ToolCallRecord>,
    iterations: usize,
) -> AgentResponse {
    let content = match content.map(str::trim).filter(|c| !c.is_empty()) {
        Some(text) => text.to_string(),
        None => tool_calls
            .last()
            .map(|r| r.outcome.message.clone())
            .unwrap_or_default(),
    };

    AgentResponse {
        content,
        tool_calls,
        iterations,
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

impl AgentResponse {
    /// The most recent tool call that produced a file.
    pub fn last_success(&self) -> Option<&ToolCallRecord> {
        self.tool_calls.iter().rev().find(|r| r.outcome.is_success())
    }
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Outcome reported by the tool.
    pub outcome: EditOutcome,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::TOOL_SPECS;
    use std::path::PathBuf;

    fn record(name: &str, outcome: EditOutcome) -> ToolCallRecord {
        ToolCallRecord {
            name: name.to_string(),
            arguments: "{}".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "trim_video".to_string(),
            arguments: r#"{"start_time": 2}"#.to_string(),
            outcome: EditOutcome::failure("nope".into()),
        };
        assert_eq!(format!("{}", record), r#"trim_video({"start_time": 2})"#);
    }

    #[test]
    fn test_instruction_format() {
        let text = instruction(Path::new("uploads/clip.mp4"), "trim from 2 to 5");
        assert_eq!(
            text,
            "The current video is at uploads/clip.mp4. The user wants to: trim from 2 to 5"
        );
    }

    #[test]
    fn test_function_tools_mirror_listing() {
        let listed: Vec<Tool> = TOOL_SPECS.iter().map(Tool::from).collect();
        let tools = function_tools(&listed);

        assert_eq!(tools.len(), listed.len());
        for (tool, source) in tools.iter().zip(&listed) {
            assert_eq!(tool.function.name, source.name);
            assert_eq!(tool.function.parameters.as_ref(), Some(&source.input_schema));
        }
    }

    #[test]
    fn test_model_text_wins() {
        let ok = EditOutcome::success(PathBuf::from("outputs/a.mp4"), "saved".into());
        let response = build_response(Some("Done!"), vec![record("trim_video", ok)], 2);
        assert_eq!(response.content, "Done!");
        assert_eq!(response.iterations, 2);
    }

    #[test]
    fn test_empty_text_falls_back_to_tool_message() {
        let ok = EditOutcome::success(
            PathBuf::from("outputs/a_trimmed_2_5.mp4"),
            "Video trimmed. New video saved at: outputs/a_trimmed_2_5.mp4".into(),
        );
        let response = build_response(Some("  "), vec![record("trim_video", ok)], 2);
        assert!(response.content.ends_with("outputs/a_trimmed_2_5.mp4"));

        let response = build_response(None, vec![], 1);
        assert!(response.content.is_empty());
    }

    #[test]
    fn test_last_success_skips_failures() {
        let ok = EditOutcome::success(PathBuf::from("outputs/a.mp4"), "saved".into());
        let bad = EditOutcome::failure("Error cropping video: bad".into());
        let response = build_response(
            None,
            vec![record("trim_video", ok), record("crop_video", bad)],
            3,
        );
        assert_eq!(response.last_success().unwrap().name, "trim_video");
        assert!(response.content.starts_with("Error cropping"));
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments("").unwrap(), serde_json::json!({}));
        assert_eq!(parse_arguments(r#"{"x1":1}"#).unwrap()["x1"], 1);
        assert!(parse_arguments("{oops").is_err());
    }
}
