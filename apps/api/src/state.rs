use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::research::SearchClient;
use crate::storage::Uploader;
use crate::topic_map::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Default: LlmClient (Anthropic Messages API).
    pub generator: Arc<dyn TextGenerator>,
    /// Default: TavilyClient.
    pub search: Arc<dyn SearchClient>,
    /// `None` when S3 settings are absent; upload requests then get 503.
    pub uploader: Option<Arc<dyn Uploader>>,
    pub sessions: SessionStore,
}
