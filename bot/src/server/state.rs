//! Server state

use std::sync::Arc;

use secrecy::SecretString;

use crate::app::state::AppState;

/// Server state shared across handlers
pub struct ServerState {
    pub app: Arc<AppState>,
    pub webhook_secret: Option<SecretString>,
}

impl ServerState {
    pub fn new(app: Arc<AppState>, webhook_secret: Option<SecretString>) -> Self {
        Self {
            app,
            webhook_secret,
        }
    }
}
