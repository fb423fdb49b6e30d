//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::storage::settings::Settings;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// GitHub API access
    pub github: GithubOptions,

    /// Webhook server configuration
    pub server: ServerOptions,

    /// Secret used to verify webhook signatures; unsigned deliveries are
    /// accepted when absent
    pub webhook_secret: Option<SecretString>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            github: GithubOptions::default(),
            server: ServerOptions::default(),
            webhook_secret: None,
        }
    }
}

impl AppOptions {
    /// Build options from a loaded settings file
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lifecycle: LifecycleOptions {
                max_shutdown_delay: Duration::from_secs(settings.max_shutdown_delay_secs),
            },
            github: GithubOptions {
                api_base_url: settings.github.api_base_url.clone(),
                token: settings.github.token.clone(),
                request_timeout: Duration::from_secs(settings.github.request_timeout_secs),
            },
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            webhook_secret: settings.webhook_secret.clone(),
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// GitHub API options
#[derive(Debug, Clone)]
pub struct GithubOptions {
    /// REST API base URL
    pub api_base_url: String,

    /// Bearer token
    pub token: Option<SecretString>,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for GithubOptions {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Webhook server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}
