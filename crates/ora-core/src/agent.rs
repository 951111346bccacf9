//! Knowledge agent trait and result type

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, SourceName};

/// Normalized output of one knowledge source, regardless of provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeResult {
    pub source: SourceName,
    pub content: String,
    pub raw_items: Vec<String>,
}

impl KnowledgeResult {
    pub fn new(source: SourceName, content: impl Into<String>) -> Self {
        Self {
            source,
            content: content.into(),
            raw_items: Vec::new(),
        }
    }

    pub fn with_raw_items(mut self, raw_items: Vec<String>) -> Self {
        self.raw_items = raw_items;
        self
    }
}

/// Trait for the per-source agents the dispatcher fans out to
///
/// An agent owns everything needed to answer a query from one knowledge
/// source and normalizes its output into a `KnowledgeResult`. Provider
/// failures that have a sensible in-source fallback (e.g. summarization
/// failing over raw snippets) are degraded inside `handle`; errors that
/// escape it cause the dispatcher to drop this source only.
#[async_trait]
pub trait KnowledgeAgent: Send + Sync {
    /// Which routing source this agent serves
    fn source(&self) -> SourceName;

    /// Answer the query from this source
    async fn handle(&self, query: &str) -> Result<KnowledgeResult>;
}
