//! Common types used across the ORA knowledge assistant

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bounded span of document text with its retrieval metadata.
///
/// Chunks are immutable once created; `sequence_id` encodes the
/// document, page, and position so a chunk can always be traced back to
/// where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub page_number: Option<u32>,
    pub sequence_id: String,
}

impl Chunk {
    pub fn new(
        text: impl Into<String>,
        source_id: impl Into<String>,
        page_number: Option<u32>,
        sequence_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            page_number,
            sequence_id: sequence_id.into(),
        }
    }

    /// Citation tag for this chunk, e.g. `[Source: report.pdf, Page: 3]`.
    pub fn citation(&self) -> String {
        match self.page_number {
            Some(page) => format!("[Source: {}, Page: {}]", self.source_id, page),
            None => format!("[Source: {}]", self.source_id),
        }
    }
}

/// Names of the knowledge sources the router can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    DocumentRag,
    WebSearch,
    Academic,
}

impl SourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::DocumentRag => "document_rag",
            SourceName::WebSearch => "web_search",
            SourceName::Academic => "academic",
        }
    }

    /// Tolerant name mapping for router output. Accepts the aliases the
    /// LLM tends to produce; unknown names yield `None` so callers can
    /// skip them.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "document_rag" | "document" | "documents" | "pdf" | "pdf_rag" | "pdf rag agent"
            | "rag" => Some(SourceName::DocumentRag),
            "web_search" | "web" | "search" | "news" | "web search agent" => {
                Some(SourceName::WebSearch)
            }
            "academic" | "arxiv" | "papers" | "research" | "arxiv agent" => {
                Some(SourceName::Academic)
            }
            _ => None,
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a routing decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOrigin {
    Llm,
    RuleFallback,
}

/// The selection of knowledge sources for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub agents: Vec<SourceName>,
    pub reason: String,
    pub origin: DecisionOrigin,
}

/// Truncate a string to at most `max_chars` characters, char-safe.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_aliases() {
        assert_eq!(SourceName::parse("PDF"), Some(SourceName::DocumentRag));
        assert_eq!(SourceName::parse("web_search"), Some(SourceName::WebSearch));
        assert_eq!(SourceName::parse(" arxiv "), Some(SourceName::Academic));
        assert_eq!(SourceName::parse("mainframe"), None);
    }

    #[test]
    fn test_citation_with_and_without_page() {
        let chunk = Chunk::new("text", "report.pdf", Some(3), "report.pdf_3_0");
        assert_eq!(chunk.citation(), "[Source: report.pdf, Page: 3]");

        let chunk = Chunk::new("text", "notes.txt", None, "notes.txt_0_0");
        assert_eq!(chunk.citation(), "[Source: notes.txt]");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefgh", 4), "abcd...");
        // Multi-byte characters must not be split mid-codepoint.
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語...");
    }
}
