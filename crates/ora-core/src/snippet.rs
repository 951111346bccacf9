//! External snippet source trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A ranked snippet returned by an external search source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Trait for external snippet sources (web search, arXiv, ...)
///
/// Each implementation is a single call to an external service that
/// returns ranked snippets. Failures map to `Error::SourceUnavailable`.
#[async_trait]
pub trait SnippetSource: Send + Sync {
    /// Human-readable name of the backing service
    fn name(&self) -> &str;

    /// Run one search and return up to `max_results` ranked snippets
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>>;
}
