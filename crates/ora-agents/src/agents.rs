//! Per-source knowledge agents

use async_trait::async_trait;
use std::sync::Arc;

use ora_core::{
    truncate_chars, KnowledgeAgent, KnowledgeResult, Result, SnippetSource, SourceName,
    TextGenerator,
};
use ora_rag::RetrievalEngine;

/// Agent answering from the user's ingested documents.
pub struct DocumentAgent {
    engine: Arc<RetrievalEngine>,
}

impl DocumentAgent {
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl KnowledgeAgent for DocumentAgent {
    fn source(&self) -> SourceName {
        SourceName::DocumentRag
    }

    async fn handle(&self, query: &str) -> Result<KnowledgeResult> {
        let answer = self.engine.query(query).await?;
        Ok(KnowledgeResult::new(SourceName::DocumentRag, answer.summary)
            .with_raw_items(answer.raw_results))
    }
}

/// Agent fetching web snippets and summarizing them with the LLM.
pub struct WebAgent {
    search: Arc<dyn SnippetSource>,
    generator: Arc<dyn TextGenerator>,
    max_results: usize,
}

impl WebAgent {
    pub fn new(search: Arc<dyn SnippetSource>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            search,
            generator,
            max_results: 5,
        }
    }
}

#[async_trait]
impl KnowledgeAgent for WebAgent {
    fn source(&self) -> SourceName {
        SourceName::WebSearch
    }

    async fn handle(&self, query: &str) -> Result<KnowledgeResult> {
        // Provider failures degrade to an explanatory answer; anything
        // else is a contract violation and propagates.
        let results = match self.search.search(query, self.max_results).await {
            Ok(results) => results,
            Err(e) if e.is_provider_failure() => {
                return Ok(KnowledgeResult::new(
                    SourceName::WebSearch,
                    format!("Web search failed: {}", e),
                ));
            }
            Err(e) => return Err(e),
        };

        if results.is_empty() {
            return Ok(KnowledgeResult::new(
                SourceName::WebSearch,
                "No relevant web results found.",
            ));
        }

        let combined = results
            .iter()
            .map(|r| r.snippet.as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let prompt = format!(
            "You are a factual summarization assistant. Summarize the following web search \
             snippets into a concise answer for the user query: \"{}\"\n\
             Focus on the most recent and relevant facts only, and use only the snippets \
             provided.\n\n\
             Web snippets:\n---\n{}\n---",
            query, combined
        );

        let summary = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) if e.is_provider_failure() => format!(
                "{}\n\n(web summarization failed: {})",
                truncate_chars(&combined, 1000),
                e
            ),
            Err(e) => return Err(e),
        };

        let raw_items = results
            .iter()
            .map(|r| format!("{} ({}): {}", r.title, r.url, r.snippet))
            .collect();

        Ok(KnowledgeResult::new(SourceName::WebSearch, summary).with_raw_items(raw_items))
    }
}

/// Agent formatting academic search hits; no generation call involved.
pub struct AcademicAgent {
    search: Arc<dyn SnippetSource>,
    max_results: usize,
}

impl AcademicAgent {
    pub fn new(search: Arc<dyn SnippetSource>) -> Self {
        Self {
            search,
            max_results: 3,
        }
    }
}

#[async_trait]
impl KnowledgeAgent for AcademicAgent {
    fn source(&self) -> SourceName {
        SourceName::Academic
    }

    async fn handle(&self, query: &str) -> Result<KnowledgeResult> {
        let results = match self.search.search(query, self.max_results).await {
            Ok(results) => results,
            Err(e) if e.is_provider_failure() => {
                return Ok(KnowledgeResult::new(
                    SourceName::Academic,
                    format!("Academic search failed: {}", e),
                ));
            }
            Err(e) => return Err(e),
        };

        if results.is_empty() {
            return Ok(KnowledgeResult::new(
                SourceName::Academic,
                "No matching papers found.",
            ));
        }

        let content = results
            .iter()
            .map(|r| format!("{} - {}", r.title, truncate_chars(&r.snippet, 200)))
            .collect::<Vec<_>>()
            .join(" | ");

        let raw_items = results
            .iter()
            .map(|r| format!("{} ({}): {}", r.title, r.url, r.snippet))
            .collect();

        Ok(KnowledgeResult::new(SourceName::Academic, content).with_raw_items(raw_items))
    }
}
