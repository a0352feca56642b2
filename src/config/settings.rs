//! Configuration settings for Reelcut.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub media: MediaSettings,
    pub agent: AgentSettings,
    pub server: ServerSettings,
    pub http: HttpSettings,
    /// File these settings were loaded from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Workspace root holding the `uploads/` and `outputs/` directories.
    pub workspace: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            workspace: ".".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// External media tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// ffmpeg binary.
    pub ffmpeg: String,
    /// ffprobe binary.
    pub ffprobe: String,
    /// Font family for text overlays (resolved through fontconfig).
    pub font: String,
    /// Explicit font file for text overlays. Takes precedence over `font`.
    pub font_file: Option<String>,
    /// Video codec used when re-encoding overlays.
    pub video_codec: String,
    /// Audio codec used when re-encoding overlays.
    pub audio_codec: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            font: "Arial".to_string(),
            font_file: None,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

/// Language-model agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Chat model name.
    pub model: String,
    /// Base URL of an OpenAI-compatible API. None = api.openai.com.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum model round-trips per turn.
    pub max_iterations: usize,
    /// Timeout for a single model request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            max_iterations: 5,
            request_timeout_secs: 300,
        }
    }
}

/// Tool server process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Command used to launch the tool server. None = this executable with `mcp`.
    pub command: Option<String>,
    /// Arguments for `command`.
    pub args: Vec<String>,
    /// Timeout for the initialize handshake, in seconds.
    pub startup_timeout_secs: u64,
    /// Timeout for a single tool call, in seconds.
    pub call_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            startup_timeout_secs: 15,
            call_timeout_secs: 600,
        }
    }
}

/// HTTP tool server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let mut settings: Settings = toml::from_str(&content)?;
            settings.source = Some(config_path);
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ReelcutError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reelcut")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded workspace root.
    pub fn workspace(&self) -> PathBuf {
        Self::expand_path(&self.general.workspace)
    }

    /// Directory that receives session uploads.
    pub fn uploads_dir(&self) -> PathBuf {
        self.workspace().join("uploads")
    }

    /// Directory that receives every operation's output.
    pub fn outputs_dir(&self) -> PathBuf {
        self.workspace().join("outputs")
    }

    /// Read the agent API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.agent.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [agent]
            model = "llama3-70b-8192"
            api_base = "https://api.groq.com/openai/v1"
            api_key_env = "GROQ_API_KEY"
            "#,
        )
        .unwrap();

        assert_eq!(settings.agent.model, "llama3-70b-8192");
        assert_eq!(settings.agent.api_key_env, "GROQ_API_KEY");
        assert_eq!(settings.agent.max_iterations, 5);
        assert_eq!(settings.media.ffmpeg, "ffmpeg");
        assert_eq!(settings.server.call_timeout_secs, 600);
        assert_eq!(settings.http.port, 8001);
    }

    #[test]
    fn test_workspace_dirs() {
        let mut settings = Settings::default();
        settings.general.workspace = "/srv/edits".to_string();
        assert_eq!(settings.uploads_dir(), PathBuf::from("/srv/edits/uploads"));
        assert_eq!(settings.outputs_dir(), PathBuf::from("/srv/edits/outputs"));
    }

    #[test]
    fn test_save_and_load_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.http.port = 9100;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.http.port, 9100);
        assert_eq!(loaded.source, Some(path));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = PathBuf::from("/definitely/not/here/config.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.general.workspace, ".");
        assert!(loaded.source.is_none());
    }
}
