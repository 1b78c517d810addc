//! Web search clients.
//!
//! A search client turns a query into ranked `(title, url)` results. The
//! orchestrator only sees the [`SearchClient`] trait, so engines can be
//! swapped (and faked in tests) without touching pipeline code.

mod duckduckgo;

pub use duckduckgo::DuckDuckGoClient;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PipelineError;

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

/// Capability set for a search backend.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Stable identifier recorded on sources, e.g. `"duckduckgo_html"`.
    fn provider_id(&self) -> &'static str;

    /// Return at most `limit` results ordered by provider relevance.
    async fn search(&self, query: &str, limit: usize)
        -> Result<Vec<SearchResult>, PipelineError>;
}

/// Create the default search client.
pub fn create_search_client() -> Arc<dyn SearchClient> {
    Arc::new(DuckDuckGoClient::new())
}
