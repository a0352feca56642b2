//! Editing sessions.
//!
//! A [`Session`] owns one uploaded video, the pointer to its latest edit, the
//! conversation transcript, and the tool server connection used to edit it.
//! The pointer only moves to files that exist on disk.

use crate::agent::{Agent, AgentResponse, ToolBackend};
use crate::config::Settings;
use crate::error::{ReelcutError, Result};
use crate::mcp::McpClient;
use crate::media::MediaEngine;
use crate::tools::ToolRegistry;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Marker that precedes an output file name in a reply.
const OUTPUT_MARKER: &str = "outputs/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// What a turn did to the edited-video pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerUpdate {
    /// The pointer now names this file.
    Advanced(PathBuf),
    /// A file was claimed but does not exist; the pointer did not move.
    Missing(PathBuf),
    Unchanged,
}

/// Result of one user turn.
#[derive(Debug)]
pub struct TurnReport {
    pub reply: String,
    pub pointer: PointerUpdate,
    pub tools_used: Vec<String>,
}

impl TurnReport {
    /// Notice to show the user about the pointer, if any.
    pub fn notice(&self) -> Option<String> {
        match &self.pointer {
            PointerUpdate::Advanced(path) => Some(format!("Current video: {}", path.display())),
            PointerUpdate::Missing(path) => Some(format!(
                "Editor said it created a file, but it was not found: {}",
                path.display()
            )),
            PointerUpdate::Unchanged => None,
        }
    }
}

/// A single-user editing session.
pub struct Session {
    id: Uuid,
    settings: Settings,
    original_path: PathBuf,
    edited_path: PathBuf,
    transcript: Vec<Turn>,
    backend: Option<Arc<dyn ToolBackend>>,
    agent: Option<Agent>,
    disabled_reason: Option<String>,
}

impl Session {
    /// Upload the video into the workspace without connecting any tools.
    pub fn open(settings: Settings, video: &Path) -> Result<Self> {
        let uploaded = upload(&settings, video)?;
        std::fs::create_dir_all(settings.outputs_dir())?;

        let id = Uuid::new_v4();
        info!("Session {} opened for {}", id, uploaded.display());

        Ok(Self {
            id,
            settings,
            original_path: uploaded.clone(),
            edited_path: uploaded,
            transcript: Vec::new(),
            backend: None,
            agent: None,
            disabled_reason: Some("tool server not started".to_string()),
        })
    }

    /// Upload the video, start the tool server and build the agent.
    ///
    /// A tool server or agent that fails to start leaves the session usable
    /// for inspection with editing disabled.
    pub async fn start(settings: Settings, video: &Path) -> Result<Self> {
        let mut session = Self::open(settings, video)?;

        match McpClient::from_settings(&session.settings).await {
            Ok(client) => session.attach(Arc::new(client)).await,
            Err(e) => session.disable(format!("tool server failed to start: {}", e)),
        }

        Ok(session)
    }

    /// Like [`Session::start`], but runs tools in this process.
    pub async fn start_in_process(settings: Settings, video: &Path) -> Result<Self> {
        let mut session = Self::open(settings, video)?;
        let registry = ToolRegistry::new(MediaEngine::new(&session.settings));
        session.attach(Arc::new(registry)).await;
        Ok(session)
    }

    /// Connect a tool backend and build the agent on top of it.
    pub async fn attach(&mut self, backend: Arc<dyn ToolBackend>) {
        match Agent::connect(&self.settings, backend.clone()).await {
            Ok(agent) => {
                self.agent = Some(agent);
                self.backend = Some(backend);
                self.disabled_reason = None;
            }
            Err(e) => {
                backend.shutdown().await;
                self.disable(format!("agent failed to start: {}", e));
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn original_path(&self) -> &Path {
        &self.original_path
    }

    /// The video the next edit applies to.
    pub fn edited_path(&self) -> &Path {
        &self.edited_path
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    pub fn editing_enabled(&self) -> bool {
        self.agent.is_some()
    }

    /// Why editing is disabled, if it is.
    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled_reason.as_deref()
    }

    /// Process one request: run the agent, then advance the pointer.
    ///
    /// Every turn leaves a user and an assistant entry in the transcript,
    /// including turns that return an error.
    pub async fn handle_turn(&mut self, prompt: &str) -> Result<TurnReport> {
        self.push(Role::User, prompt);

        let Some(agent) = &self.agent else {
            let reason = self.disabled_reason.as_deref().unwrap_or("no agent");
            let reply = format!("Editing is disabled for this session: {}", reason);
            self.push(Role::Assistant, &reply);
            return Ok(TurnReport {
                reply,
                pointer: PointerUpdate::Unchanged,
                tools_used: Vec::new(),
            });
        };

        let result = agent.edit(&self.edited_path, prompt).await;
        let response = match result {
            Ok(response) => response,
            Err(ReelcutError::ToolUnreachable(msg)) => {
                let reply = format!("The editing tools are unreachable: {}", msg);
                self.disable(format!("tool server unreachable: {}", msg));
                self.shutdown_backend().await;
                self.push(Role::Assistant, &reply);
                return Ok(TurnReport {
                    reply,
                    pointer: PointerUpdate::Unchanged,
                    tools_used: Vec::new(),
                });
            }
            Err(e) => {
                self.push(Role::Assistant, &format!("Error: {}", e));
                return Err(e);
            }
        };

        self.push(Role::Assistant, &response.content);

        let pointer = resolve_output(&response, &self.settings.outputs_dir());
        if let PointerUpdate::Advanced(path) = &pointer {
            info!("Session {} now editing {}", self.id, path.display());
            self.edited_path = path.clone();
        } else if let PointerUpdate::Missing(path) = &pointer {
            warn!("Claimed output does not exist: {}", path.display());
        }

        Ok(TurnReport {
            reply: response.content,
            pointer,
            tools_used: response.tool_calls.iter().map(|r| r.name.clone()).collect(),
        })
    }

    /// Shut the tool server down. Editing stays disabled afterwards.
    pub async fn close(&mut self) {
        self.agent = None;
        self.shutdown_backend().await;
        self.disabled_reason = Some("session closed".to_string());
        info!("Session {} closed", self.id);
    }

    fn disable(&mut self, reason: String) {
        warn!("Editing disabled: {}", reason);
        self.agent = None;
        self.disabled_reason = Some(reason);
    }

    async fn shutdown_backend(&mut self) {
        if let Some(backend) = self.backend.take() {
            backend.shutdown().await;
        }
    }

    fn push(&mut self, role: Role, content: &str) {
        self.transcript.push(Turn {
            role,
            content: content.to_string(),
            at: Utc::now(),
        });
    }
}

/// Copy the video into `uploads/`, keeping its file name.
fn upload(settings: &Settings, video: &Path) -> Result<PathBuf> {
    if !video.is_file() {
        return Err(ReelcutError::Session(format!(
            "video not found: {}",
            video.display()
        )));
    }
    let name = video.file_name().ok_or_else(|| {
        ReelcutError::Session(format!("not a file path: {}", video.display()))
    })?;

    let uploads = settings.uploads_dir();
    std::fs::create_dir_all(&uploads)?;
    let target = uploads.join(name);

    let same_file = match (video.canonicalize(), target.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same_file {
        std::fs::copy(video, &target)?;
    }
    Ok(target)
}

/// Decide where the pointer goes after a reply.
///
/// The structured outcome of the last successful tool call wins; the reply
/// text is only scanned when no tool reported a file.
pub fn resolve_output(response: &AgentResponse, outputs_dir: &Path) -> PointerUpdate {
    let claimed = response
        .last_success()
        .and_then(|r| r.outcome.output_path.clone())
        .or_else(|| extract_output_path(&response.content, outputs_dir));

    match claimed {
        Some(path) if path.is_file() => PointerUpdate::Advanced(path),
        Some(path) => PointerUpdate::Missing(path),
        None => PointerUpdate::Unchanged,
    }
}

/// Find the file named after the last `outputs/` marker in `text`.
///
/// Only a plain file name directly inside `outputs_dir` is accepted.
pub fn extract_output_path(text: &str, outputs_dir: &Path) -> Option<PathBuf> {
    let pattern = Regex::new(&format!(r"{}(\S+)", regex::escape(OUTPUT_MARKER))).ok()?;
    let token = pattern
        .captures_iter(text)
        .last()?
        .get(1)?
        .as_str()
        .trim_end_matches(|c: char| ".,;:!?)]}\"'`*".contains(c));

    let mut parts = Path::new(token).components();
    match (parts.next(), parts.next()) {
        (Some(Component::Normal(name)), None) => Some(outputs_dir.join(name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolCallRecord;
    use crate::mcp::Tool;
    use crate::media::EditOutcome;
    use crate::tools::TOOL_SPECS;
    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn settings_in(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.workspace = dir.to_string_lossy().to_string();
        settings
    }

    fn response(content: &str, outcomes: Vec<EditOutcome>) -> AgentResponse {
        AgentResponse {
            content: content.to_string(),
            tool_calls: outcomes
                .into_iter()
                .map(|outcome| ToolCallRecord {
                    name: "trim_video".to_string(),
                    arguments: "{}".to_string(),
                    outcome,
                })
                .collect(),
            iterations: 1,
        }
    }

    #[test]
    fn test_extract_output_path() {
        let outputs = Path::new("/ws/outputs");
        assert_eq!(
            extract_output_path(
                "Video trimmed. New video saved at: outputs/clip_trimmed_2_5.mp4.",
                outputs
            ),
            Some(PathBuf::from("/ws/outputs/clip_trimmed_2_5.mp4"))
        );
        assert_eq!(
            extract_output_path("First outputs/a.mp4, then `outputs/b.mp4`", outputs),
            Some(PathBuf::from("/ws/outputs/b.mp4"))
        );
        assert_eq!(extract_output_path("No file was produced.", outputs), None);
        assert_eq!(extract_output_path("see outputs/ .", outputs), None);
    }

    #[test]
    fn test_extract_rejects_paths_outside_outputs() {
        let outputs = Path::new("/ws/outputs");
        assert_eq!(extract_output_path("Saved at outputs//etc/passwd", outputs), None);
        assert_eq!(extract_output_path("Saved at outputs/../secret.mp4", outputs), None);
        assert_eq!(extract_output_path("Saved at outputs/nested/clip.mp4", outputs), None);
        assert_eq!(extract_output_path("Saved at outputs/./clip.mp4", outputs), None);
        assert_eq!(
            extract_output_path("Saved at outputs/../x.mp4, then outputs/clip.mp4", outputs),
            Some(PathBuf::from("/ws/outputs/clip.mp4"))
        );
    }

    #[test]
    fn test_text_fallback_ignores_escaping_path() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = dir.path().join("outputs");
        std::fs::create_dir_all(&outputs).unwrap();
        std::fs::write(dir.path().join("secret.mp4"), b"x").unwrap();

        let update = resolve_output(&response("Saved at outputs/../secret.mp4", vec![]), &outputs);
        assert_eq!(update, PointerUpdate::Unchanged);
    }

    #[test]
    fn test_open_copies_upload() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"not really a video").unwrap();

        let workspace = dir.path().join("ws");
        let session = Session::open(settings_in(&workspace), &source).unwrap();

        assert_eq!(session.original_path(), workspace.join("uploads").join("clip.mp4"));
        assert_eq!(session.edited_path(), session.original_path());
        assert!(session.original_path().is_file());
        assert!(workspace.join("outputs").is_dir());
        assert!(!session.editing_enabled());
    }

    #[test]
    fn test_open_missing_video() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::open(settings_in(dir.path()), &dir.path().join("nope.mp4"))
            .err()
            .unwrap();
        assert!(matches!(err, ReelcutError::Session(_)));
    }

    #[test]
    fn test_open_from_uploads_is_noop_copy() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        let source = uploads.join("clip.mp4");
        std::fs::write(&source, b"data").unwrap();

        let session = Session::open(settings_in(dir.path()), &source).unwrap();
        assert_eq!(std::fs::read(session.original_path()).unwrap(), b"data");
    }

    #[test]
    fn test_structured_outcome_advances() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip_trimmed_2_5.mp4");
        std::fs::write(&output, b"x").unwrap();

        let ok = EditOutcome::success(output.clone(), "saved".into());
        let update = resolve_output(&response("All done.", vec![ok]), dir.path());
        assert_eq!(update, PointerUpdate::Advanced(output));
    }

    #[test]
    fn test_text_fallback_advances() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip_speed_2.0x.mp4"), b"x").unwrap();

        let update = resolve_output(
            &response("Sped up! Saved at outputs/clip_speed_2.0x.mp4.", vec![]),
            dir.path(),
        );
        assert_eq!(update, PointerUpdate::Advanced(dir.path().join("clip_speed_2.0x.mp4")));
    }

    #[test]
    fn test_claimed_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let update = resolve_output(
            &response("Saved at outputs/ghost.mp4", vec![]),
            dir.path(),
        );
        let missing = dir.path().join("ghost.mp4");
        assert_eq!(update, PointerUpdate::Missing(missing.clone()));

        let report = TurnReport {
            reply: String::new(),
            pointer: update,
            tools_used: vec![],
        };
        assert_eq!(
            report.notice().unwrap(),
            format!("Editor said it created a file, but it was not found: {}", missing.display())
        );
    }

    #[test]
    fn test_failure_leaves_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let bad = EditOutcome::failure("Error cropping video: empty region".into());
        let update = resolve_output(&response("Error cropping video: empty region", vec![bad]), dir.path());
        assert_eq!(update, PointerUpdate::Unchanged);
    }

    #[tokio::test]
    async fn test_disabled_session_replies_without_editing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"x").unwrap();

        let mut session = Session::open(settings_in(dir.path()), &source).unwrap();
        let report = session.handle_turn("trim from 2 to 5").await.unwrap();

        assert!(report.reply.starts_with("Editing is disabled"));
        assert_eq!(report.pointer, PointerUpdate::Unchanged);
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[0].role, Role::User);

        session.close().await;
        assert_eq!(session.disabled_reason(), Some("session closed"));
    }

    #[tokio::test]
    async fn test_missing_api_key_disables_editing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"x").unwrap();

        let mut settings = settings_in(dir.path());
        settings.agent.api_key_env = "REELCUT_TEST_UNSET_KEY".to_string();

        let session = Session::start_in_process(settings, &source).await.unwrap();
        assert!(!session.editing_enabled());
        assert!(session.disabled_reason().unwrap().contains("REELCUT_TEST_UNSET_KEY"));
    }

    // A local OpenAI-compatible endpoint drives the real agent loop.

    const MODEL_KEY_ENV: &str = "REELCUT_TEST_MODEL_KEY";

    /// Replays canned chat completions in order and records each request.
    struct ScriptedModel {
        replies: Mutex<VecDeque<(StatusCode, Value)>>,
        requests: Mutex<Vec<Value>>,
    }

    impl ScriptedModel {
        fn requests(&self) -> Vec<Value> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn completions(
        State(model): State<Arc<ScriptedModel>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        model.requests.lock().unwrap().push(body);
        let next = model.replies.lock().unwrap().pop_front();
        match next {
            Some((status, reply)) => (status, Json(reply)),
            None => (StatusCode::BAD_REQUEST, Json(api_error("no more scripted replies"))),
        }
    }

    async fn serve_model(replies: Vec<(StatusCode, Value)>) -> (String, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(model.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v1", addr), model)
    }

    fn completion(message: Value, finish_reason: &str) -> (StatusCode, Value) {
        (
            StatusCode::OK,
            json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 1_700_000_000u32,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": message,
                    "finish_reason": finish_reason,
                }],
            }),
        )
    }

    fn tool_call_reply(name: &str, arguments: Value) -> (StatusCode, Value) {
        completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()},
                }],
            }),
            "tool_calls",
        )
    }

    fn text_reply(content: &str) -> (StatusCode, Value) {
        completion(json!({"role": "assistant", "content": content}), "stop")
    }

    fn api_error(message: &str) -> Value {
        json!({"error": {"message": message, "type": "invalid_request_error", "param": null, "code": null}})
    }

    fn model_settings(dir: &Path, base: String) -> Settings {
        std::env::set_var(MODEL_KEY_ENV, "test-key");
        let mut settings = settings_in(dir);
        settings.agent.api_base = Some(base);
        settings.agent.api_key_env = MODEL_KEY_ENV.to_string();
        settings
    }

    fn source_clip(dir: &Path) -> PathBuf {
        let source = dir.join("clip.mp4");
        std::fs::write(&source, b"not really a video").unwrap();
        source
    }

    enum Script {
        /// Write this file and report it as the edit's output.
        Writes(PathBuf),
        Unreachable,
    }

    struct ScriptedTools {
        script: Script,
        calls: AtomicUsize,
        shut_down: AtomicBool,
    }

    impl ScriptedTools {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicUsize::new(0),
                shut_down: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl ToolBackend for ScriptedTools {
        async fn list_tools(&self) -> Result<Vec<Tool>> {
            Ok(TOOL_SPECS.iter().map(Tool::from).collect())
        }

        async fn call_tool(&self, _name: &str, _arguments: Value) -> Result<EditOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Writes(path) => {
                    std::fs::write(path, b"edited")?;
                    let message = format!("Video successfully trimmed. New video saved at: {}", path.display());
                    Ok(EditOutcome::success(path.clone(), message))
                }
                Script::Unreachable => Err(ReelcutError::ToolUnreachable(
                    "no reply within 1s".to_string(),
                )),
            }
        }

        async fn shutdown(&self) {
            self.shut_down.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_turn_with_successful_tool_advances_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("outputs").join("clip_trimmed_2_5.mp4");
        let (base, model) = serve_model(vec![
            tool_call_reply("trim_video", json!({"video_path": "uploads/clip.mp4", "start_time": 2, "end_time": 5})),
            text_reply("Trimmed to 2-5s. New video saved at: outputs/clip_trimmed_2_5.mp4"),
        ])
        .await;

        let mut session = Session::open(model_settings(dir.path(), base), &source_clip(dir.path())).unwrap();
        let tools = ScriptedTools::new(Script::Writes(output.clone()));
        session.attach(tools.clone()).await;
        assert!(session.editing_enabled(), "{:?}", session.disabled_reason());

        let report = session.handle_turn("keep seconds 2 to 5").await.unwrap();

        assert_eq!(report.pointer, PointerUpdate::Advanced(output.clone()));
        assert_eq!(report.tools_used, vec!["trim_video".to_string()]);
        assert_eq!(session.edited_path(), output);
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].role, Role::Assistant);
        assert!(session.transcript()[1].content.starts_with("Trimmed to 2-5s."));
        assert_eq!(tools.calls.load(Ordering::SeqCst), 1);

        // The tool result went back to the model before it answered.
        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["tools"].as_array().unwrap().len(), 4);
        let last = requests[1]["messages"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["role"], "tool");
        assert!(last["content"].as_str().unwrap().starts_with("Video successfully trimmed"));
    }

    #[tokio::test]
    async fn test_turn_with_empty_crop_keeps_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let (base, model) = serve_model(vec![
            tool_call_reply("crop_video", json!({"video_path": "uploads/clip.mp4", "x1": 40, "y1": 0, "x2": 40, "y2": 100})),
            text_reply("I could not crop: the region is empty."),
        ])
        .await;

        let mut session =
            Session::start_in_process(model_settings(dir.path(), base), &source_clip(dir.path()))
                .await
                .unwrap();
        assert!(session.editing_enabled(), "{:?}", session.disabled_reason());

        let report = session.handle_turn("crop to nothing").await.unwrap();

        assert_eq!(report.pointer, PointerUpdate::Unchanged);
        assert_eq!(session.edited_path(), session.original_path());
        assert_eq!(session.transcript().len(), 2);

        let requests = model.requests();
        let last = requests[1]["messages"].as_array().unwrap().last().unwrap().clone();
        assert!(last["content"].as_str().unwrap().starts_with("Error cropping video:"));
    }

    #[tokio::test]
    async fn test_unreachable_tools_disable_session() {
        let dir = tempfile::tempdir().unwrap();
        let (base, _model) = serve_model(vec![tool_call_reply(
            "trim_video",
            json!({"video_path": "uploads/clip.mp4", "start_time": 0, "end_time": 1}),
        )])
        .await;

        let mut session = Session::open(model_settings(dir.path(), base), &source_clip(dir.path())).unwrap();
        let tools = ScriptedTools::new(Script::Unreachable);
        session.attach(tools.clone()).await;

        let report = session.handle_turn("trim the first second").await.unwrap();

        assert!(report.reply.starts_with("The editing tools are unreachable"));
        assert_eq!(report.pointer, PointerUpdate::Unchanged);
        assert!(!session.editing_enabled());
        assert!(session.disabled_reason().unwrap().contains("unreachable"));
        assert!(tools.shut_down.load(Ordering::SeqCst));
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.edited_path(), session.original_path());

        let next = session.handle_turn("try again").await.unwrap();
        assert!(next.reply.starts_with("Editing is disabled"));
        assert_eq!(tools.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_agent_error_is_recorded_in_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let (base, _model) = serve_model(vec![(
            StatusCode::BAD_REQUEST,
            api_error("model not available"),
        )])
        .await;

        let mut session = Session::open(model_settings(dir.path(), base), &source_clip(dir.path())).unwrap();
        let output = dir.path().join("outputs").join("unused.mp4");
        session.attach(ScriptedTools::new(Script::Writes(output))).await;

        let err = session.handle_turn("make it faster").await.unwrap_err();

        assert!(matches!(err, ReelcutError::OpenAI(_)));
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].role, Role::Assistant);
        assert!(session.transcript()[1].content.starts_with("Error:"));
        assert!(session.transcript()[1].content.contains("model not available"));
        assert!(session.editing_enabled());
    }

    #[tokio::test]
    async fn test_turn_trims_with_ffmpeg() {
        let has_ffmpeg = std::process::Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if !has_ffmpeg {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        let status = std::process::Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-f", "lavfi", "-i", "testsrc=duration=8:size=160x120:rate=10"])
            .args(["-c:v", "mpeg4"])
            .arg(&source)
            .status()
            .unwrap();
        assert!(status.success());

        let uploaded = dir.path().join("uploads").join("clip.mp4");
        let (base, _model) = serve_model(vec![
            tool_call_reply("trim_video", json!({"video_path": uploaded, "start_time": 2, "end_time": 5})),
            text_reply("Done."),
        ])
        .await;

        let mut session = Session::start_in_process(model_settings(dir.path(), base), &source)
            .await
            .unwrap();
        let report = session.handle_turn("keep 2 to 5").await.unwrap();

        let expected = dir.path().join("outputs").join("clip_trimmed_2_5.mp4");
        assert_eq!(report.pointer, PointerUpdate::Advanced(expected.clone()));
        assert_eq!(session.edited_path(), expected);
    }
}
