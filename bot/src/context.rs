//! Per-event context

use std::sync::Arc;

use crate::github::{GithubApi, RepoRef};
use crate::template::TemplateRenderer;

/// Everything a component needs to act on behalf of one webhook delivery
#[derive(Clone)]
pub struct EventContext {
    /// Repository the event belongs to
    pub repo: RepoRef,

    /// Hosting platform access
    pub github: Arc<dyn GithubApi>,

    /// Renderer for target templates
    pub renderer: Arc<TemplateRenderer>,

    /// Delivery id used to correlate log lines
    pub delivery: String,
}

impl EventContext {
    pub fn new(
        repo: RepoRef,
        github: Arc<dyn GithubApi>,
        renderer: Arc<TemplateRenderer>,
        delivery: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            github,
            renderer,
            delivery: delivery.into(),
        }
    }
}
