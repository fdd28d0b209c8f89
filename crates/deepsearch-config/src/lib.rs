//! # deepsearch configuration
//!
//! One TOML file, four sections, all optional:
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [chat]
//! provider = "openai"
//! model = "gpt-4o-mini"
//!
//! [search]
//! provider = "serper"
//!
//! [auth]
//! mode = "tokens"
//! [auth.tokens]
//! "dev-token" = { id = "dev" }
//! ```
//!
//! Secrets come from the environment first (`OPENAI_API_KEY`,
//! `SERPER_API_KEY`, `SEARXNG_PASSWORD`) and fall back to values in the file.

mod components;
pub mod credentials;
mod error;
mod loader;

pub use components::{
    AppConfig, AuthConfig, AuthMode, AuthUser, ChatConfig, LlmProviderType, SearchConfig,
    SearchProviderType, ServerConfig,
};
pub use credentials::{resolve_secret, CredentialSource};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, CONFIG_ENV_VAR};
