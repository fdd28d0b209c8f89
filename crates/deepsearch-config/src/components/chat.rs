//! Chat model and orchestration settings

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::credentials::{resolve_secret, OPENAI_API_KEY_ENV};
use crate::error::{ConfigError, ConfigResult};

/// Supported chat backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// OpenAI or any compatible `/chat/completions` endpoint
    #[default]
    OpenAI,
    Ollama,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub provider: LlmProviderType,
    /// Chat model; provider default when unset
    pub model: Option<String>,
    /// Endpoint URL; provider default when unset
    pub endpoint: Option<String>,
    /// Fallback when `OPENAI_API_KEY` is not set
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Model HTTP timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Model generations allowed per turn
    pub max_steps: Option<u32>,
    /// Replaces the built-in system prompt
    pub system_prompt: Option<String>,
    /// Deadline for a whole chat request
    pub request_timeout_secs: Option<u64>,
    /// Capacity of the orchestrator → transport event queue
    pub channel_buffer: Option<usize>,
}

impl ChatConfig {
    /// Get the LLM endpoint, using provider-specific default if not specified
    pub fn llm_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| match self.provider {
            LlmProviderType::OpenAI => "https://api.openai.com/v1".to_string(),
            LlmProviderType::Ollama => "http://localhost:11434".to_string(),
        })
    }

    /// Get the chat model, using provider-specific default if not specified
    pub fn chat_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider {
            LlmProviderType::OpenAI => defaults::DEFAULT_OPENAI_MODEL.to_string(),
            LlmProviderType::Ollama => defaults::DEFAULT_OLLAMA_MODEL.to_string(),
        })
    }

    /// API key from `OPENAI_API_KEY`, else from the file
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(OPENAI_API_KEY_ENV, self.api_key.as_deref()).map(|(key, _)| key)
    }

    pub fn require_api_key(&self) -> ConfigResult<String> {
        self.api_key().ok_or(ConfigError::MissingCredential {
            env_var: OPENAI_API_KEY_ENV,
            field: "chat.api_key",
        })
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(defaults::DEFAULT_TIMEOUT_SECS)
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps.unwrap_or(defaults::DEFAULT_MAX_STEPS)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(defaults::DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn channel_buffer(&self) -> usize {
        self.channel_buffer.unwrap_or(defaults::DEFAULT_CHANNEL_BUFFER)
    }
}
