//! Search gateway and tool adapter
//!
//! - [`web`]: providers that turn a query into normalized [`SearchResult`]s
//! - [`search_web`]: the `searchWeb` tool the model calls
//!
//! [`SearchResult`]: deepsearch_core::SearchResult

pub mod search_web;
pub mod web;

pub use search_web::{SearchWebParams, SearchWebTool};
pub use web::{create_search_provider, SearxngProvider, SerperProvider};
