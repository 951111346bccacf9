//! DuckDuckGo web snippet source

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::form_urlencoded;

use ora_core::{Error, Result, Snippet, SnippetSource};

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; ora/0.1)";

/// Web search source backed by the DuckDuckGo HTML results page.
///
/// One blocking GET per query; result anchors and snippet spans are
/// picked out of the returned page.
pub struct DuckDuckGoSource {
    client: Client,
}

impl DuckDuckGoSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SnippetSource for DuckDuckGoSource {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = format!("{}?q={}", SEARCH_URL, encoded);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("web search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::SourceUnavailable(format!(
                "web search returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("web search read failed: {}", e)))?;

        Ok(parse_results(&body, max_results))
    }
}

/// Pull `{title, url, snippet}` triples out of the HTML results page.
fn parse_results(body: &str, max_results: usize) -> Vec<Snippet> {
    // Selectors over constant strings; parse failures here would be a
    // programming error, so they reduce to an empty result set.
    let (Ok(result_sel), Ok(title_sel), Ok(snippet_sel)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(body);
    let mut snippets = Vec::new();

    for result in document.select(&result_sel) {
        let Some(anchor) = result.select(&title_sel).next() else {
            continue;
        };
        let title = anchor.text().collect::<String>().trim().to_string();
        let url = anchor.value().attr("href").unwrap_or_default().to_string();
        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(|s| s.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        if title.is_empty() && snippet.is_empty() {
            continue;
        }
        snippets.push(Snippet {
            title,
            url,
            snippet,
        });
        if snippets.len() >= max_results {
            break;
        }
    }

    snippets
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
        <div class="result">
            <a class="result__a" href="https://example.com/a">First Result</a>
            <a class="result__snippet">Snippet text one.</a>
        </div>
        <div class="result">
            <a class="result__a" href="https://example.com/b">Second Result</a>
            <a class="result__snippet">Snippet text two.</a>
        </div>
        <div class="result">
            <a class="result__a" href="https://example.com/c">Third Result</a>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_results() {
        let snippets = parse_results(FIXTURE, 10);
        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0].title, "First Result");
        assert_eq!(snippets[0].url, "https://example.com/a");
        assert_eq!(snippets[0].snippet, "Snippet text one.");
        assert_eq!(snippets[2].snippet, "");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let snippets = parse_results(FIXTURE, 2);
        assert_eq!(snippets.len(), 2);
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html></html>", 5).is_empty());
    }
}
