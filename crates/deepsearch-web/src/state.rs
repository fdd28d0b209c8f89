use std::sync::Arc;
use std::time::Duration;

use deepsearch_agents::ChatOrchestrator;
use deepsearch_config::AppConfig;
use deepsearch_core::traits::SessionResolver;
use deepsearch_llm::create_chat_provider;
use deepsearch_tools::{create_search_provider, SearchWebTool};
use tracing::info;

use crate::auth::create_session_resolver;
use crate::services::RelaySettings;
use crate::{Result, WebError};

/// Shared, read-only state for every request
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: ChatOrchestrator,
    pub sessions: Arc<dyn SessionResolver>,
    pub relay: RelaySettings,
}

impl AppState {
    pub fn new(
        orchestrator: ChatOrchestrator,
        sessions: Arc<dyn SessionResolver>,
        relay: RelaySettings,
    ) -> Self {
        Self {
            orchestrator,
            sessions,
            relay,
        }
    }

    /// Wire providers, tool and resolver from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = create_chat_provider(&config.chat)
            .map_err(|e| WebError::Config(format!("chat provider: {e}")))?;
        let search = create_search_provider(&config.search)
            .map_err(|e| WebError::Config(format!("search provider: {e}")))?;

        info!(
            chat_provider = provider.provider_name(),
            model = %config.chat.chat_model(),
            search_provider = search.name(),
            "Providers ready"
        );

        let tool = SearchWebTool::new(search).with_max_results(config.search.max_results());
        let mut orchestrator = ChatOrchestrator::new(provider, Arc::new(tool))
            .with_model(config.chat.chat_model())
            .with_temperature(config.chat.temperature)
            .with_max_tokens(config.chat.max_tokens)
            .with_max_steps(config.chat.max_steps())
            .with_sources_from_results(config.search.sources_from_results);
        if let Some(prompt) = &config.chat.system_prompt {
            orchestrator = orchestrator.with_system_prompt(prompt.clone());
        }

        let relay = RelaySettings {
            request_timeout: Duration::from_secs(config.chat.request_timeout_secs()),
            channel_buffer: config.chat.channel_buffer(),
        };

        Ok(Self::new(
            orchestrator,
            create_session_resolver(&config.auth)?,
            relay,
        ))
    }
}
