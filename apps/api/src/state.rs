use std::sync::Arc;

use crate::chat::session::ChatSettings;
use crate::chat::store::SessionStore;
use crate::config::Config;
use crate::llm_client::ChatModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The hosted model. `LlmClient` in production, a scripted model in tests.
    pub llm: Arc<dyn ChatModel>,
    pub settings: ChatSettings,
    /// Per-browser conversation state. Nothing in here is shared across sessions.
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn ChatModel>) -> Self {
        Self {
            settings: ChatSettings::from_config(&config),
            llm,
            sessions: SessionStore::new(),
        }
    }
}
