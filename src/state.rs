//! Application state: prompt config, the completion provider, and the
//! question store.
//!
//! The store is the only mutable shared state in the process, and it is
//! passed around explicitly rather than living in a global. Everything else
//! here is immutable after startup.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::config::{load_agent_config_from_env, Prompts};
use crate::openai::{CompletionProvider, OpenAi};
use crate::store::{QuestionStore, DEFAULT_BATCH_TTL};

pub struct AppState {
    pub provider: Option<Arc<dyn CompletionProvider>>,
    pub prompts: Prompts,
    pub store: QuestionStore,
}

impl AppState {
    /// Build state from env: load prompt config, init the provider, size the
    /// batch TTL.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let prompts = load_agent_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let ttl = std::env::var("BATCH_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_BATCH_TTL);

        let provider: Option<Arc<dyn CompletionProvider>> = match OpenAi::from_env() {
            Some(oa) => {
                info!(target: "probaquiz_backend", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Some(Arc::new(oa))
            }
            None => {
                info!(target: "probaquiz_backend", "OpenAI disabled (no OPENAI_API_KEY); generation will fail as upstream_unavailable.");
                None
            }
        };

        Self { provider, prompts, store: QuestionStore::new(ttl) }
    }

    /// State with an explicit provider. Used by tests to substitute a
    /// scripted provider.
    pub fn with_provider(
        provider: Arc<dyn CompletionProvider>,
        prompts: Prompts,
        ttl: Duration,
    ) -> Self {
        Self { provider: Some(provider), prompts, store: QuestionStore::new(ttl) }
    }

    /// State with no provider at all; every generation call fails upstream.
    pub fn without_provider(prompts: Prompts, ttl: Duration) -> Self {
        Self { provider: None, prompts, store: QuestionStore::new(ttl) }
    }
}
