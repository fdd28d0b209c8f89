//! Chat provider implementations

pub mod ollama;
pub mod openai;

// Re-export providers
pub use ollama::OllamaChatProvider;
pub use openai::OpenAIChatProvider;

use std::sync::Arc;

use deepsearch_config::{ChatConfig, LlmProviderType};
use deepsearch_core::traits::{ChatProvider, LlmError, LlmResult};

/// Create a chat provider from configuration
pub fn create_chat_provider(config: &ChatConfig) -> LlmResult<Arc<dyn ChatProvider>> {
    match config.provider {
        LlmProviderType::Ollama => {
            let provider = OllamaChatProvider::new(
                config.llm_endpoint(),
                config.chat_model(),
                config.timeout_secs(),
            );
            Ok(Arc::new(provider))
        }
        LlmProviderType::OpenAI => {
            let api_key = config
                .require_api_key()
                .map_err(|e| LlmError::ConfigError(e.to_string()))?;

            let provider = OpenAIChatProvider::new(
                api_key,
                config.endpoint.clone(),
                config.chat_model(),
                config.timeout_secs(),
            );
            Ok(Arc::new(provider))
        }
    }
}
