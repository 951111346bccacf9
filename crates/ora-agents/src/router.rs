//! Routing decision maker: LLM-guided source selection with rule fallback

use serde::Deserialize;
use std::sync::Arc;

use ora_core::{DecisionOrigin, Error, Result, RoutingDecision, SourceName, TextGenerator};

/// Keyword rules and source priority for the deterministic fallback.
///
/// Priority order is policy, not a hardcoded assumption: the first
/// source in `priority` whose keywords match wins, and a query matching
/// nothing goes to `default_source`.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    pub priority: Vec<SourceName>,
    pub document_keywords: Vec<&'static str>,
    pub academic_keywords: Vec<&'static str>,
    pub web_keywords: Vec<&'static str>,
    pub default_source: SourceName,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            priority: vec![
                SourceName::DocumentRag,
                SourceName::Academic,
                SourceName::WebSearch,
            ],
            document_keywords: vec!["pdf", "document", "doc", "file", "report", "upload"],
            academic_keywords: vec!["paper", "research", "arxiv", "study", "publication"],
            web_keywords: vec!["news", "latest", "today", "current"],
            default_source: SourceName::WebSearch,
        }
    }
}

impl RoutingPolicy {
    fn keywords_for(&self, source: SourceName) -> &[&'static str] {
        match source {
            SourceName::DocumentRag => &self.document_keywords,
            SourceName::Academic => &self.academic_keywords,
            SourceName::WebSearch => &self.web_keywords,
        }
    }

    /// Deterministic keyword routing: exactly one source, evaluated in
    /// priority order.
    pub fn fallback(&self, query: &str, cause: &str) -> RoutingDecision {
        let lower = query.to_lowercase();
        for &source in &self.priority {
            if let Some(keyword) = self
                .keywords_for(source)
                .iter()
                .find(|k| lower.contains(*k))
            {
                return RoutingDecision {
                    agents: vec![source],
                    reason: format!(
                        "rule fallback ({}): query matched keyword '{}'",
                        cause, keyword
                    ),
                    origin: DecisionOrigin::RuleFallback,
                };
            }
        }
        RoutingDecision {
            agents: vec![self.default_source],
            reason: format!("rule fallback ({}): no keyword matched, using default", cause),
            origin: DecisionOrigin::RuleFallback,
        }
    }
}

/// Decides which knowledge sources should handle a query.
///
/// The primary path asks the text-generation capability for a structured
/// selection; any generation or parse failure drops to the keyword
/// rules. The decision never has an empty agent set.
pub struct Router {
    generator: Arc<dyn TextGenerator>,
    policy: RoutingPolicy,
}

#[derive(Deserialize)]
struct RouteReply {
    #[serde(alias = "agents")]
    agents_used: Vec<String>,
    #[serde(default)]
    reason: String,
}

impl Router {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_policy(generator, RoutingPolicy::default())
    }

    pub fn with_policy(generator: Arc<dyn TextGenerator>, policy: RoutingPolicy) -> Self {
        Self { generator, policy }
    }

    pub async fn decide(&self, query: &str) -> RoutingDecision {
        match self.llm_decision(query).await {
            Ok(decision) => decision,
            Err(e) => self.policy.fallback(query, &e.to_string()),
        }
    }

    async fn llm_decision(&self, query: &str) -> Result<RoutingDecision> {
        let raw = self.generator.generate(&routing_prompt(query)).await?;
        parse_decision(&raw)
    }
}

fn routing_prompt(query: &str) -> String {
    format!(
        "You are the routing controller of a multi-source knowledge assistant. \
         Available sources:\n\
         - document_rag: answers from the user's uploaded documents\n\
         - web_search: current events, news, and general web facts\n\
         - academic: scientific papers and research on arXiv\n\n\
         Selection rules, in priority order:\n\
         1. Any mention of an uploaded document, PDF, file, or report MUST include document_rag.\n\
         2. Mentions of news, latest, or current events include web_search.\n\
         3. Mentions of papers or research include academic.\n\
         4. Multiple cues combine; pick every source that applies, at least one.\n\n\
         Respond with JSON only, exactly this shape:\n\
         {{\"agents_used\": [\"source_name\", ...], \"reason\": \"one sentence\"}}\n\n\
         QUERY: {}",
        query
    )
}

/// Parse the router reply: strict JSON first, then the first balanced
/// brace-delimited fragment embedded in the text.
fn parse_decision(raw: &str) -> Result<RoutingDecision> {
    let reply: RouteReply = match serde_json::from_str(raw.trim()) {
        Ok(reply) => reply,
        Err(_) => {
            let fragment = extract_json_object(raw)
                .ok_or_else(|| Error::Parse(format!("no JSON object in router reply: {raw:?}")))?;
            serde_json::from_str(fragment)
                .map_err(|e| Error::Parse(format!("malformed router reply: {}", e)))?
        }
    };

    let mut agents = Vec::new();
    for name in &reply.agents_used {
        if let Some(source) = SourceName::parse(name) {
            if !agents.contains(&source) {
                agents.push(source);
            }
        }
        // Unknown names are dropped; routing drift is tolerated.
    }

    if agents.is_empty() {
        return Err(Error::Parse(format!(
            "router reply selected no known source: {:?}",
            reply.agents_used
        )));
    }

    Ok(RoutingDecision {
        agents,
        reason: if reply.reason.is_empty() {
            "model gave no reason".to_string()
        } else {
            reply.reason
        },
        origin: DecisionOrigin::Llm,
    })
}

/// Find the first balanced `{...}` fragment, string-literal aware.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(Error::Generation("provider offline".to_string()))
        }
    }

    fn router_with_reply(reply: &str) -> Router {
        Router::new(Arc::new(CannedGenerator(reply.to_string())))
    }

    #[tokio::test]
    async fn test_strict_json_reply() {
        let router = router_with_reply(
            r#"{"agents_used": ["document_rag", "web_search"], "reason": "doc plus news cues"}"#,
        );
        let decision = router.decide("summarize the report and recent news").await;
        assert_eq!(
            decision.agents,
            vec![SourceName::DocumentRag, SourceName::WebSearch]
        );
        assert_eq!(decision.origin, DecisionOrigin::Llm);
        assert_eq!(decision.reason, "doc plus news cues");
    }

    #[tokio::test]
    async fn test_embedded_json_in_prose() {
        let router = router_with_reply(
            "Sure thing! My selection is {\"agents_used\": [\"arxiv\"], \"reason\": \"research query\"} - done.",
        );
        let decision = router.decide("find papers on attention").await;
        assert_eq!(decision.agents, vec![SourceName::Academic]);
        assert_eq!(decision.origin, DecisionOrigin::Llm);
    }

    #[tokio::test]
    async fn test_unknown_names_are_dropped() {
        let router = router_with_reply(
            r#"{"agents_used": ["mainframe", "web_search"], "reason": "r"}"#,
        );
        let decision = router.decide("whatever").await;
        assert_eq!(decision.agents, vec![SourceName::WebSearch]);
    }

    #[tokio::test]
    async fn test_all_unknown_falls_back_to_rules() {
        let router = router_with_reply(r#"{"agents_used": ["mainframe"], "reason": "r"}"#);
        let decision = router.decide("summarize the document").await;
        assert_eq!(decision.origin, DecisionOrigin::RuleFallback);
        assert_eq!(decision.agents, vec![SourceName::DocumentRag]);
    }

    #[tokio::test]
    async fn test_garbage_reply_falls_back() {
        let router = router_with_reply("I cannot decide, sorry!");
        let decision = router.decide("what is rust").await;
        assert_eq!(decision.origin, DecisionOrigin::RuleFallback);
        assert!(!decision.agents.is_empty());
        assert!(decision.reason.contains("rule fallback"));
    }

    #[tokio::test]
    async fn test_fallback_determinism_when_generation_fails() {
        let router = Router::new(Arc::new(FailingGenerator));

        let decision = router.decide("what does the document say about margins").await;
        assert_eq!(decision.agents, vec![SourceName::DocumentRag]);

        let decision = router.decide("find a paper on diffusion models").await;
        assert_eq!(decision.agents, vec![SourceName::Academic]);

        let decision = router.decide("who won the match yesterday").await;
        assert_eq!(decision.agents, vec![SourceName::WebSearch]);
        assert_eq!(decision.origin, DecisionOrigin::RuleFallback);
    }

    #[tokio::test]
    async fn test_document_cue_outranks_academic_cue() {
        let router = Router::new(Arc::new(FailingGenerator));
        let decision = router.decide("find the paper mentioned in my document").await;
        assert_eq!(decision.agents, vec![SourceName::DocumentRag]);
    }

    #[test]
    fn test_extract_json_object_ignores_braces_in_strings() {
        let text = r#"prefix {"reason": "uses { and } inside", "agents_used": ["web"]} suffix"#;
        let fragment = extract_json_object(text).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(fragment).is_ok());
    }

    #[test]
    fn test_extract_json_object_unbalanced() {
        assert_eq!(extract_json_object("{\"a\": "), None);
        assert_eq!(extract_json_object("no braces at all"), None);
    }
}
