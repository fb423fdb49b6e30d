//! Settings file management

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::info;

use crate::errors::BotError;
use crate::logs::LogLevel;

/// Environment variable overriding `github.token`
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable overriding `webhook_secret`
pub const WEBHOOK_SECRET_ENV: &str = "WEBHOOK_SECRET";

/// Bot settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    /// Webhook server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// GitHub API configuration
    #[serde(default)]
    pub github: GithubSettings,

    /// Shared secret for `X-Hub-Signature-256`
    #[serde(default)]
    pub webhook_secret: Option<SecretString>,

    #[serde(default = "default_max_shutdown_delay")]
    pub max_shutdown_delay_secs: u64,
}

fn default_max_shutdown_delay() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            server: ServerSettings::default(),
            github: GithubSettings::default(),
            webhook_secret: None,
            max_shutdown_delay_secs: default_max_shutdown_delay(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults when the
    /// file does not exist
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let path = path.as_ref();
        if tokio::fs::metadata(path).await.is_err() {
            info!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply `GITHUB_TOKEN` and `WEBHOOK_SECRET` from the environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(GITHUB_TOKEN_ENV).ok(),
            std::env::var(WEBHOOK_SECRET_ENV).ok(),
        )
    }

    fn with_overrides(mut self, token: Option<String>, secret: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.github.token = Some(SecretString::from(token));
        }
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.webhook_secret = Some(SecretString::from(secret));
        }
        self
    }
}

/// Webhook server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// GitHub API settings
#[derive(Debug, Clone, Deserialize)]
pub struct GithubSettings {
    /// REST API base URL, override for GitHub Enterprise
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub token: Option<SecretString>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}
