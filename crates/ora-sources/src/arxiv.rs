//! arXiv academic snippet source

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use url::form_urlencoded;

use ora_core::{Error, Result, Snippet, SnippetSource};

const API_URL: &str = "https://export.arxiv.org/api/query";

/// Academic search source backed by the arXiv Atom API.
///
/// One GET per query; entries are pulled out of the Atom feed with
/// tolerant regex extraction rather than a full XML parse.
pub struct ArxivSource {
    client: Client,
    entry_re: Regex,
    title_re: Regex,
    id_re: Regex,
    summary_re: Regex,
}

impl ArxivSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            entry_re: compile(r"(?s)<entry>(.*?)</entry>")?,
            title_re: compile(r"(?s)<title>(.*?)</title>")?,
            id_re: compile(r"(?s)<id>(.*?)</id>")?,
            summary_re: compile(r"(?s)<summary>(.*?)</summary>")?,
        })
    }

    fn parse_feed(&self, feed: &str, max_results: usize) -> Vec<Snippet> {
        self.entry_re
            .captures_iter(feed)
            .take(max_results)
            .map(|entry| {
                let body = entry.get(1).map(|m| m.as_str()).unwrap_or_default();
                Snippet {
                    title: self.extract(&self.title_re, body),
                    url: self.extract(&self.id_re, body),
                    snippet: self.extract(&self.summary_re, body),
                }
            })
            .filter(|s| !s.title.is_empty() || !s.snippet.is_empty())
            .collect()
    }

    fn extract(&self, re: &Regex, body: &str) -> String {
        re.captures(body)
            .and_then(|c| c.get(1))
            .map(|m| unescape(m.as_str().trim()))
            .unwrap_or_default()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Configuration(format!("bad regex: {}", e)))
}

/// Undo the XML entity escaping arXiv applies to text content.
fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[async_trait]
impl SnippetSource for ArxivSource {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = format!(
            "{}?search_query=all:{}&start=0&max_results={}",
            API_URL, encoded, max_results
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("arXiv request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::SourceUnavailable(format!(
                "arXiv returned status {}",
                response.status()
            )));
        }

        let feed = response
            .text()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("arXiv read failed: {}", e)))?;

        Ok(self.parse_feed(&feed, max_results))
    }
}
