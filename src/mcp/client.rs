//! MCP client for a tool server running as a child process.
//!
//! One request is in flight at a time. Every exchange is bounded by a
//! timeout; on timeout or a broken pipe the child is killed and the client
//! stays disconnected, reporting [`ReelcutError::ToolUnreachable`].

use super::protocol::*;
use super::server::PROTOCOL_VERSION;
use crate::config::Settings;
use crate::error::{ReelcutError, Result};
use crate::media::EditOutcome;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How to launch the tool server.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ServerCommand {
    /// The configured command, or this executable's own `mcp` subcommand.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if let Some(command) = &settings.server.command {
            return Ok(Self {
                program: Settings::expand_path(command),
                args: settings.server.args.clone(),
                cwd: None,
            });
        }

        let program = std::env::current_exe()?;
        let mut args = Vec::new();
        if let Some(source) = &settings.source {
            args.push("--config".to_string());
            args.push(source.to_string_lossy().to_string());
        }
        args.push("mcp".to_string());

        Ok(Self {
            program,
            args,
            cwd: None,
        })
    }
}

struct Connection {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// Client side of the stdio tool server.
pub struct McpClient {
    connection: Mutex<Option<Connection>>,
    next_id: AtomicU64,
    call_timeout: Duration,
}

impl McpClient {
    /// Spawn the server and complete the initialize handshake.
    pub async fn spawn(
        command: &ServerCommand,
        startup_timeout: Duration,
        call_timeout: Duration,
    ) -> Result<Self> {
        info!("Starting tool server: {} {}", command.program.display(), command.args.join(" "));

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            ReelcutError::ToolServer(format!(
                "failed to start tool server '{}': {}",
                command.program.display(),
                e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelcutError::ToolServer("tool server has no stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelcutError::ToolServer("tool server has no stdout".into()))?;

        let client = Self {
            connection: Mutex::new(Some(Connection {
                child,
                stdin,
                stdout: BufReader::new(stdout).lines(),
            })),
            next_id: AtomicU64::new(1),
            call_timeout,
        };

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "reelcut-session",
                "version": env!("CARGO_PKG_VERSION"),
            }
        });
        let init = client
            .request_with_timeout("initialize", Some(params), startup_timeout)
            .await?;
        debug!("Tool server initialized: {}", init);

        client
            .notify("notifications/initialized")
            .await?;

        Ok(client)
    }

    /// Spawn using the settings' command and timeouts.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let command = ServerCommand::from_settings(settings)?;
        Self::spawn(
            &command,
            Duration::from_secs(settings.server.startup_timeout_secs),
            Duration::from_secs(settings.server.call_timeout_secs),
        )
        .await
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Fetch the server's tool list.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result = self.request("tools/list", None).await?;
        let list: ToolsListResult = serde_json::from_value(result)?;
        Ok(list.tools)
    }

    /// Invoke a tool and recover its outcome.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<EditOutcome> {
        let params = serde_json::to_value(ToolCallParams {
            name: name.to_string(),
            arguments: Some(arguments),
        })?;
        let result = self.request("tools/call", Some(params)).await?;
        let result: ToolCallResult = serde_json::from_value(result)?;
        Ok(result.into_outcome())
    }

    /// Close stdin and wait briefly for the server to exit, then kill it.
    pub async fn shutdown(&self) {
        let Some(mut conn) = self.connection.lock().await.take() else {
            return;
        };

        drop(conn.stdin);
        match tokio::time::timeout(Duration::from_secs(2), conn.child.wait()).await {
            Ok(Ok(status)) => debug!("Tool server exited: {}", status),
            _ => {
                warn!("Tool server did not exit, killing it");
                let _ = conn.child.kill().await;
            }
        }
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.request_with_timeout(method, params, self.call_timeout)
            .await
    }

    async fn request_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        let mut guard = self.connection.lock().await;
        let conn = guard.as_mut().ok_or_else(|| {
            ReelcutError::ToolUnreachable("tool server is not running".into())
        })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        let exchange = tokio::time::timeout(timeout, Self::exchange(conn, &request)).await;

        let failure = match exchange {
            Ok(Ok(response)) => {
                if let Some(error) = response.error {
                    return Err(ReelcutError::ToolServer(format!(
                        "{} (code {})",
                        error.message, error.code
                    )));
                }
                return Ok(response.result.unwrap_or(Value::Null));
            }
            Ok(Err(e)) => format!("{} failed: {}", method, e),
            Err(_) => format!("{} timed out after {}s", method, timeout.as_secs()),
        };

        warn!("Tool server unreachable: {}", failure);
        if let Some(mut conn) = guard.take() {
            let _ = conn.child.kill().await;
        }
        Err(ReelcutError::ToolUnreachable(failure))
    }

    async fn notify(&self, method: &str) -> Result<()> {
        let mut guard = self.connection.lock().await;
        let conn = guard.as_mut().ok_or_else(|| {
            ReelcutError::ToolUnreachable("tool server is not running".into())
        })?;
        Self::write_frame(&mut conn.stdin, &JsonRpcRequest::notification(method)).await
    }

    /// Write a request and read frames until the matching response arrives.
    async fn exchange(conn: &mut Connection, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        Self::write_frame(&mut conn.stdin, request).await?;

        loop {
            let line = conn.stdout.next_line().await?.ok_or_else(|| {
                ReelcutError::ToolUnreachable("tool server closed its output".into())
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let response: JsonRpcResponse = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    debug!("Skipping non-response frame ({}): {}", e, line);
                    continue;
                }
            };

            if response.id == request.id {
                return Ok(response);
            }
            debug!("Skipping response for id {:?}", response.id);
        }
    }

    async fn write_frame(stdin: &mut ChildStdin, request: &JsonRpcRequest) -> Result<()> {
        let mut frame = serde_json::to_string(request)?;
        frame.push('\n');
        stdin.write_all(frame.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> ServerCommand {
        ServerCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: None,
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_startup_error() {
        let command = ServerCommand {
            program: PathBuf::from("/no/such/reelcut-server"),
            args: vec![],
            cwd: None,
        };
        let err = McpClient::spawn(&command, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ReelcutError::ToolServer(_)));
    }

    #[tokio::test]
    async fn test_silent_server_times_out_as_unreachable() {
        let err = McpClient::spawn(&shell("sleep 30"), Duration::from_millis(200), Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ReelcutError::ToolUnreachable(_)), "{}", err);
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_server_exit_is_unreachable() {
        let err = McpClient::spawn(&shell("exit 0"), Duration::from_secs(2), Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ReelcutError::ToolUnreachable(_)), "{}", err);
    }

    #[test]
    fn test_configured_command_wins() {
        let mut settings = Settings::default();
        settings.server.command = Some("/opt/reelcut/bin/server".to_string());
        settings.server.args = vec!["--stdio".to_string()];

        let command = ServerCommand::from_settings(&settings).unwrap();
        assert_eq!(command.program, PathBuf::from("/opt/reelcut/bin/server"));
        assert_eq!(command.args, vec!["--stdio"]);
    }

    #[test]
    fn test_default_command_forwards_config() {
        let mut settings = Settings::default();
        settings.source = Some(PathBuf::from("/etc/reelcut.toml"));

        let command = ServerCommand::from_settings(&settings).unwrap();
        assert_eq!(command.args, vec!["--config", "/etc/reelcut.toml", "mcp"]);
    }
}
