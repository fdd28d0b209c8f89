//! Web search providers
//!
//! Serper is the default backend; SearXNG is available for self-hosting.
//!
//! ```toml
//! [search]
//! provider = "searxng"
//! endpoint = "http://localhost:8888"
//! ```

mod search;

pub use search::{create_client, create_search_provider, SearxngProvider, SerperProvider};
