//! Error types for deploybot

use thiserror::Error;

/// Main error type for deploybot
#[derive(Error, Debug)]
pub enum BotError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The repository has no deployment configuration at the requested ref
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    /// The configuration did not pass schema validation
    #[error("{property} {message}")]
    ConfigInvalid { property: String, message: String },

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    /// Required status checks have not passed yet (HTTP 409)
    #[error("Deployment conflict: {0}")]
    DeployConflict(String),

    #[error("GitHub API error ({status}): {message}")]
    PlatformError { status: u16, message: String },

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Signature error: {0}")]
    SignatureError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}

impl BotError {
    /// Whether this is the benign "no config in this repository" condition
    pub fn is_config_not_found(&self) -> bool {
        matches!(self, BotError::ConfigNotFound(_))
    }

    /// Whether this is a 409 conflict from the deployments API
    pub fn is_conflict(&self) -> bool {
        matches!(self, BotError::DeployConflict(_))
    }
}

impl From<minijinja::Error> for BotError {
    fn from(err: minijinja::Error) -> Self {
        BotError::TemplateError(err.to_string())
    }
}
