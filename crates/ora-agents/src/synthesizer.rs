//! Synthesizer: merge knowledge-source results into one answer

use std::sync::Arc;

use ora_core::{KnowledgeResult, TextGenerator};

/// Answer when routing and dispatch produced nothing at all.
pub const NO_SOURCES_MESSAGE: &str =
    "None of the knowledge sources produced an answer for this query.";

/// Merges one or more knowledge-source results.
///
/// A single result is returned verbatim; the generation call is only
/// spent when there is actually something to merge. Synthesis never
/// drops information: on generation failure the raw source outputs are
/// returned under a failure annotation.
pub struct Synthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl Synthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn merge(&self, query: &str, results: &[KnowledgeResult]) -> String {
        match results {
            [] => NO_SOURCES_MESSAGE.to_string(),
            [only] => only.content.clone(),
            _ => self.merge_many(query, results).await,
        }
    }

    async fn merge_many(&self, query: &str, results: &[KnowledgeResult]) -> String {
        let sections = concatenated(results);
        let prompt = format!(
            "Multiple knowledge sources answered the user query: \"{}\"\n\n\
             Merge them into one coherent answer. Rules:\n\
             - If sources contradict each other, say so explicitly and name the sources; \
             never silently pick one.\n\
             - Preserve technical details, figures, and numbers exactly.\n\
             - Answer directly, with no preamble.\n\n\
             Source outputs:\n\n{}",
            query, sections
        );

        match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => format!(
                "(synthesis failed: {}; raw source outputs follow)\n\n{}",
                e, sections
            ),
        }
    }
}

fn concatenated(results: &[KnowledgeResult]) -> String {
    results
        .iter()
        .map(|r| format!("## {}\n{}", r.source, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
