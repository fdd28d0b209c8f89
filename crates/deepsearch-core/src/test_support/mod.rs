//! Test doubles shared by the workspace's test suites
//!
//! Enabled for this crate's own tests and, elsewhere, through the
//! `test-utils` feature.

mod mocks;

pub use mocks::{
    FailingSearchProvider, HangingSearchProvider, ScriptedChatProvider, ScriptedTurn,
    StaticSearchProvider,
};

use crate::traits::SearchResult;

/// `n` distinct search results in a stable order
pub fn sample_results(n: usize) -> Vec<SearchResult> {
    (1..=n)
        .map(|i| {
            SearchResult::new(
                format!("Result {i}"),
                format!("https://example.com/{i}"),
                format!("Snippet {i}"),
            )
        })
        .collect()
}
