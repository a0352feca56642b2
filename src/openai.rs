//! OpenAI-compatible client configuration.

use crate::config::Settings;
use crate::error::{ReelcutError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a chat client for the configured endpoint, key and timeout.
///
/// Any OpenAI-compatible API works, e.g. Groq at
/// `https://api.groq.com/openai/v1`.
pub fn create_client(settings: &Settings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key().ok_or_else(|| {
        ReelcutError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            settings.agent.api_key_env, settings.agent.api_key_env
        ))
    })?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = &settings.agent.api_base {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(
        config,
        Duration::from_secs(settings.agent.request_timeout_secs),
    )
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Client::with_config(config).with_http_client(http_client))
}
