//! Dispatcher: concurrent fan-out to the selected knowledge agents

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use ora_core::{
    truncate_chars, Error, KnowledgeAgent, KnowledgeResult, Result, RoutingDecision,
    SkippedSource, SourceName,
};

/// What came back from one dispatch round.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Results from the sources that completed, in decision order.
    pub results: Vec<KnowledgeResult>,
    /// Sources that were dropped, with the cause (timeout or failure).
    pub skipped: Vec<SkippedSource>,
}

/// Invokes the agents selected by a routing decision.
///
/// Per-source invocations are independent and run concurrently under a
/// per-source timeout; a timed-out or failed source is dropped from the
/// round without failing the request. Only a consistency violation
/// aborts the whole dispatch. Sources with no registered agent are
/// skipped silently to tolerate routing drift.
pub struct Dispatcher {
    agents: HashMap<SourceName, Arc<dyn KnowledgeAgent>>,
    per_source_timeout: Duration,
    preview_len: usize,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
            per_source_timeout: Duration::from_secs(45),
            preview_len: 300,
        }
    }

    pub fn with_timeout(mut self, per_source_timeout: Duration) -> Self {
        self.per_source_timeout = per_source_timeout;
        self
    }

    pub fn register(&mut self, agent: Arc<dyn KnowledgeAgent>) {
        self.agents.insert(agent.source(), agent);
    }

    pub async fn dispatch(
        &self,
        query: &str,
        decision: &RoutingDecision,
    ) -> Result<DispatchOutcome> {
        let mut selected: Vec<(SourceName, Arc<dyn KnowledgeAgent>)> = Vec::new();
        for &source in &decision.agents {
            if selected.iter().any(|(s, _)| *s == source) {
                continue;
            }
            if let Some(agent) = self.agents.get(&source) {
                selected.push((source, Arc::clone(agent)));
            }
            // No agent registered under this name: skip silently.
        }

        let tasks = selected.into_iter().map(|(source, agent)| {
            let query = query.to_string();
            let per_source_timeout = self.per_source_timeout;
            async move {
                let outcome = timeout(per_source_timeout, agent.handle(&query)).await;
                (source, outcome)
            }
        });

        let mut outcome = DispatchOutcome::default();
        for (source, invocation) in join_all(tasks).await {
            match invocation {
                Ok(Ok(mut result)) => {
                    result.raw_items = result
                        .raw_items
                        .iter()
                        .map(|item| truncate_chars(item, self.preview_len))
                        .collect();
                    outcome.results.push(result);
                }
                Ok(Err(e @ Error::Consistency(_))) => return Err(e),
                Ok(Err(e)) => outcome.skipped.push(SkippedSource {
                    source,
                    cause: e.to_string(),
                }),
                Err(_) => outcome.skipped.push(SkippedSource {
                    source,
                    cause: format!("timed out after {:?}", self.per_source_timeout),
                }),
            }
        }

        Ok(outcome)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
