//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.formrelay/config.json`) and environment.
//! Credentials are resolved once at startup; a missing credential is fatal.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Sendbird API base. `{app_id}` is replaced with the event's application id.
pub const DEFAULT_CHAT_API_BASE: &str = "https://api-{app_id}.sendbird.com";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat platform (Sendbird) API settings.
    #[serde(default)]
    pub chat_platform: ChatPlatformConfig,

    /// Downstream automation webhook settings.
    #[serde(default)]
    pub automation: AutomationConfig,
}

/// Server bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP (default 8000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; the webhook source must reach it).
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    8000
}

fn default_server_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// Chat platform API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPlatformConfig {
    /// Static API token sent as `Api-Token`. Overridden by SENDBIRD_API_TOKEN env when set.
    pub api_token: Option<String>,
    /// API base URL template; `{app_id}` is substituted per request.
    #[serde(default = "default_chat_api_base")]
    pub api_base: String,
}

fn default_chat_api_base() -> String {
    DEFAULT_CHAT_API_BASE.to_string()
}

impl Default for ChatPlatformConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_base: default_chat_api_base(),
        }
    }
}

/// Automation webhook config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationConfig {
    /// Destination for `{email, transcript}` POSTs. Overridden by AUTOMATION_WEBHOOK_URL env when set.
    pub webhook_url: Option<String>,
}

/// Missing required startup configuration. Aborts startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chat platform API token not configured (set SENDBIRD_API_TOKEN or chatPlatform.apiToken)")]
    MissingApiToken,
    #[error("automation webhook URL not configured (set AUTOMATION_WEBHOOK_URL or automation.webhookUrl)")]
    MissingWebhookUrl,
}

/// Validated credentials and endpoints the relay needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub api_token: String,
    pub api_base: String,
    pub webhook_url: String,
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Chat platform API token: env SENDBIRD_API_TOKEN overrides config.
fn resolve_api_token_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Option<String> {
    env("SENDBIRD_API_TOKEN")
        .and_then(|s| non_empty(&s))
        .or_else(|| config.chat_platform.api_token.as_deref().and_then(non_empty))
}

/// Automation webhook URL: env AUTOMATION_WEBHOOK_URL overrides config.
fn resolve_webhook_url_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Option<String> {
    env("AUTOMATION_WEBHOOK_URL")
        .and_then(|s| non_empty(&s))
        .or_else(|| config.automation.webhook_url.as_deref().and_then(non_empty))
}

/// Resolve everything the relay needs from config and environment.
/// Fails when the token or webhook URL is absent.
pub fn resolve_settings(config: &Config) -> Result<RelaySettings, ConfigError> {
    resolve_settings_with(config, |k| std::env::var(k).ok())
}

fn resolve_settings_with(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<RelaySettings, ConfigError> {
    let api_token = resolve_api_token_with(config, &env).ok_or(ConfigError::MissingApiToken)?;
    let webhook_url = resolve_webhook_url_with(config, &env).ok_or(ConfigError::MissingWebhookUrl)?;
    let api_base = non_empty(&config.chat_platform.api_base).unwrap_or_else(default_chat_api_base);
    Ok(RelaySettings {
        api_token,
        api_base,
        webhook_url,
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RELAY_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".formrelay").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, else the default path (or RELAY_CONFIG_PATH). Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
