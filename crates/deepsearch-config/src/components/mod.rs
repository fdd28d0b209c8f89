//! Configuration sections

mod auth;
mod chat;
mod search;
mod server;

pub use auth::{AuthConfig, AuthMode, AuthUser};
pub use chat::{ChatConfig, LlmProviderType};
pub use search::{SearchConfig, SearchProviderType};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Defaults shared by the section accessors
pub(crate) mod defaults {
    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
    pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_MAX_STEPS: u32 = 10;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_CHANNEL_BUFFER: usize = 64;
    pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 15;
    /// Upper bound the search provider accepts for `num`
    pub const MAX_SEARCH_RESULTS: usize = 10;
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub search: SearchConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Reject values the server cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chat.max_steps() == 0 {
            return Err(ConfigError::Invalid("chat.max_steps must be at least 1".into()));
        }
        if self.chat.channel_buffer() == 0 {
            return Err(ConfigError::Invalid(
                "chat.channel_buffer must be at least 1".into(),
            ));
        }
        if self.chat.request_timeout_secs() == 0 {
            return Err(ConfigError::Invalid(
                "chat.request_timeout_secs must be at least 1".into(),
            ));
        }
        let max_results = self.search.max_results();
        if max_results == 0 || max_results > defaults::MAX_SEARCH_RESULTS {
            return Err(ConfigError::Invalid(format!(
                "search.max_results must be between 1 and {}",
                defaults::MAX_SEARCH_RESULTS
            )));
        }
        if self.auth.mode == AuthMode::Http && self.auth.session_url.is_none() {
            return Err(ConfigError::Invalid(
                "auth.session_url is required when auth.mode = \"http\"".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.chat.max_steps(), 10);
        assert_eq!(config.chat.request_timeout_secs(), 60);
        assert_eq!(config.search.max_results(), 10);
        assert!(!config.search.sources_from_results);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_file_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            allowed_origins = ["http://localhost:5173"]

            [chat]
            provider = "ollama"
            model = "qwen2.5"
            max_steps = 4
            system_prompt = "Be brief."

            [search]
            provider = "searxng"
            endpoint = "http://localhost:8888"
            max_results = 5
            sources_from_results = true

            [auth]
            mode = "tokens"
            [auth.tokens]
            "secret" = { id = "alice", name = "Alice" }
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.chat.provider, LlmProviderType::Ollama);
        assert_eq!(config.chat.chat_model(), "qwen2.5");
        assert_eq!(config.chat.max_steps(), 4);
        assert_eq!(config.search.provider, SearchProviderType::Searxng);
        assert_eq!(config.search.max_results(), 5);
        assert_eq!(config.auth.tokens["secret"].id, "alice");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn max_results_above_provider_cap_rejected() {
        let config: AppConfig = toml::from_str("[search]\nmax_results = 50").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn http_auth_requires_session_url() {
        let config: AppConfig = toml::from_str("[auth]\nmode = \"http\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_step_budget_rejected() {
        let config: AppConfig = toml::from_str("[chat]\nmax_steps = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_provider_rejected() {
        assert!(toml::from_str::<AppConfig>("[chat]\nprovider = \"bard\"").is_err());
    }
}
