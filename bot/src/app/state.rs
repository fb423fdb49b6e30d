//! Application state management

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::app::options::GithubOptions;
use crate::deploy::lock::KeyedLock;
use crate::errors::BotError;
use crate::github::client::GithubClient;
use crate::github::GithubApi;
use crate::template::TemplateRenderer;

/// Tracks when the last webhook delivery was handled
pub struct ActivityTracker {
    last_touched: AtomicU64,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            last_touched: AtomicU64::new(0),
        }
    }

    pub fn touch(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.last_touched.store(now, Ordering::SeqCst);
    }

    /// Unix seconds of the last delivery, `None` before the first one
    pub fn last_touched(&self) -> Option<u64> {
        match self.last_touched.load(Ordering::SeqCst) {
            0 => None,
            secs => Some(secs),
        }
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Main application state
pub struct AppState {
    /// Hosting platform access
    pub github: Arc<dyn GithubApi>,

    /// Renderer for target templates
    pub renderer: Arc<TemplateRenderer>,

    /// Single-flight lock shared by every auto-deploy
    pub deploy_lock: Arc<KeyedLock>,

    /// Activity tracker
    pub activity_tracker: Arc<ActivityTracker>,
}

impl AppState {
    /// Create state around an existing platform client
    pub fn new(github: Arc<dyn GithubApi>) -> Self {
        Self {
            github,
            renderer: Arc::new(TemplateRenderer::new()),
            deploy_lock: Arc::new(KeyedLock::new()),
            activity_tracker: Arc::new(ActivityTracker::new()),
        }
    }

    /// Initialize application state with a GitHub REST client
    pub fn init(options: &GithubOptions) -> Result<Self, BotError> {
        info!("Initializing application state...");

        if options.token.is_none() {
            info!("No GitHub token configured, API calls will be unauthenticated");
        }
        let client = GithubClient::new(
            &options.api_base_url,
            options.token.clone(),
            options.request_timeout,
        )?;

        Ok(Self::new(Arc::new(client)))
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), BotError> {
        info!(
            "Shutting down application state ({} deploy locks held)...",
            self.deploy_lock.active_keys()
        );
        Ok(())
    }
}
