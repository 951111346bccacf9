//! Orchestration controller: route, dispatch, synthesize, trace

use chrono::Utc;
use std::sync::Arc;

use ora_core::{Result, TraceRecord, TraceSink};

use crate::dispatcher::Dispatcher;
use crate::router::Router;
use crate::synthesizer::Synthesizer;

/// Composes the router, dispatcher, and synthesizer, and emits one
/// trace record per answered query.
pub struct Controller {
    router: Router,
    dispatcher: Dispatcher,
    synthesizer: Synthesizer,
    sink: Arc<dyn TraceSink>,
}

impl Controller {
    pub fn new(
        router: Router,
        dispatcher: Dispatcher,
        synthesizer: Synthesizer,
        sink: Arc<dyn TraceSink>,
    ) -> Self {
        Self {
            router,
            dispatcher,
            synthesizer,
            sink,
        }
    }

    /// Answer a query end to end, returning the final answer and the
    /// trace record that was appended to the log.
    pub async fn answer(&self, query: &str) -> Result<(String, TraceRecord)> {
        let decision = self.router.decide(query).await;

        let outcome = match self.dispatcher.dispatch(query, &decision).await {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Warning: dispatch failed: {}", e);
                return Err(e);
            }
        };
        for skip in &outcome.skipped {
            eprintln!(
                "Warning: source {} dropped from this answer: {}",
                skip.source, skip.cause
            );
        }

        let mut final_answer = self.synthesizer.merge(query, &outcome.results).await;
        // When every remaining source was dropped, the answer must still
        // say why the selected sources produced nothing.
        if outcome.results.is_empty() && !outcome.skipped.is_empty() {
            let causes: Vec<String> = outcome
                .skipped
                .iter()
                .map(|skip| format!("{}: {}", skip.source, skip.cause))
                .collect();
            final_answer = format!(
                "{}\n\nSources that could not be reached: {}",
                final_answer,
                causes.join("; ")
            );
        }

        let record = TraceRecord {
            timestamp: Utc::now(),
            query: query.to_string(),
            decision,
            agents_used: outcome.results.iter().map(|r| r.source).collect(),
            skipped_sources: outcome.skipped,
            retrieved_docs: outcome
                .results
                .iter()
                .flat_map(|r| r.raw_items.iter().cloned())
                .collect(),
            final_answer: final_answer.clone(),
        };

        // A broken trace log must not break the answer itself.
        if let Err(e) = self.sink.append(&record).await {
            eprintln!("Warning: failed to append trace record: {}", e);
        }

        Ok((final_answer, record))
    }

    /// Read-only passthrough to the trace log.
    pub async fn trace_log(&self) -> Result<Vec<TraceRecord>> {
        self.sink.read_all().await
    }
}
