//! Retrieval engine: ingestion and citation-grounded query

use std::sync::Arc;

use ora_core::{Chunk, Embedder, Error, Result, TextGenerator};

use crate::chunker::{extract_pages, split_text};
use crate::vector_store::{SearchOutcome, VectorIndexStore};

/// User-facing response when nothing has been ingested yet.
pub const NOT_READY_MESSAGE: &str =
    "No documents have been ingested yet. Upload a document before asking about it.";

/// User-facing response when retrieval finds nothing useful.
pub const NO_MATCH_MESSAGE: &str =
    "Could not find relevant information in the ingested documents for this query.";

/// Configuration for chunking and retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub max_chunk_len: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: 1000,
            chunk_overlap: 200,
            top_k: 5,
        }
    }
}

/// Answer produced by a retrieval query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalAnswer {
    pub summary: String,
    pub raw_results: Vec<String>,
}

/// The ingestion and query pipeline over the vector index store.
pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<VectorIndexStore>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<VectorIndexStore>,
    ) -> Self {
        Self::with_config(embedder, generator, store, RetrievalConfig::default())
    }

    pub fn with_config(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<VectorIndexStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            generator,
            store,
            config,
        }
    }

    /// Ingest one document: extract pages (PDF or plain text), chunk,
    /// embed in one batch, and append to the index.
    ///
    /// Returns the number of chunks indexed. A document that yields no
    /// text reports zero chunks and leaves the existing index untouched.
    pub async fn ingest(&self, bytes: &[u8], document_id: &str) -> Result<usize> {
        let pages = extract_pages(bytes)?;
        let mut chunks = Vec::new();

        for page in &pages {
            let pieces = split_text(&page.text, self.config.max_chunk_len, self.config.chunk_overlap);
            for (i, text) in pieces.into_iter().enumerate() {
                let sequence_id = format!("{}_{}_{}", document_id, page.number, i);
                chunks.push(Chunk::new(text, document_id, Some(page.number), sequence_id));
            }
        }

        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Consistency(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let count = chunks.len();
        self.store.add(chunks, embeddings)?;
        Ok(count)
    }

    /// Answer a query from the ingested documents.
    ///
    /// Every entry of `raw_results` is a stored chunk prefixed with its
    /// citation tag, in ranked order. Generation failure degrades to the
    /// raw cited context; an empty or unready index yields the
    /// distinguished not-ready / no-match messages.
    pub async fn query(&self, query: &str) -> Result<RetrievalAnswer> {
        if self.store.is_empty()? {
            return Ok(RetrievalAnswer {
                summary: NOT_READY_MESSAGE.to_string(),
                raw_results: Vec::new(),
            });
        }

        let mut query_embeddings = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = query_embeddings
            .pop()
            .ok_or_else(|| Error::Embedding("embedder returned no vector for the query".to_string()))?;

        let outcome = self.store.search(&query_vector, self.config.top_k)?;
        let hits = match outcome {
            SearchOutcome::NotReady => {
                return Ok(RetrievalAnswer {
                    summary: NOT_READY_MESSAGE.to_string(),
                    raw_results: Vec::new(),
                });
            }
            SearchOutcome::Hits(hits) => hits,
        };

        if hits.is_empty() {
            return Ok(RetrievalAnswer {
                summary: NO_MATCH_MESSAGE.to_string(),
                raw_results: Vec::new(),
            });
        }

        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        let chunks = self.store.chunks_at(&positions)?;

        let cited: Vec<String> = chunks
            .iter()
            .map(|chunk| format!("{} {}", chunk.citation(), chunk.text))
            .collect();
        let context = cited.join("\n\n");

        let prompt = grounded_prompt(query, &context);
        let summary = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => format!(
                "(answer generation failed: {}; returning the retrieved context directly)\n\n{}",
                e, context
            ),
        };

        Ok(RetrievalAnswer {
            summary,
            raw_results: cited,
        })
    }
}

fn grounded_prompt(query: &str, context: &str) -> String {
    format!(
        "You are an expert document analyzer. Answer the user's question based ONLY on the \
         following context. Keep each [Source, Page] citation tag adjacent to the facts it \
         supports. If the context does not contain the answer, say that you cannot find it \
         in the provided documents.\n\n\
         --- CONTEXT ---\n{}\n---------------\n\n\
         USER QUESTION: {}",
        context, query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ora_core::{Embedder, TextGenerator};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Deterministic embedder: maps text onto a 4-dim vector from simple
    /// surface features so that similar texts land close together.
    struct MockEmbedder;

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, texts: &[String]) -> ora_core::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| feature_vector(t)).collect())
        }
    }

    fn feature_vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let len = lower.chars().count() as f32;
        vec![
            if lower.contains("revenue") { 1.0 } else { 0.0 },
            if lower.contains("weather") { 1.0 } else { 0.0 },
            if lower.contains("rust") { 1.0 } else { 0.0 },
            (len % 7.0) / 7.0,
        ]
    }

    struct MockGenerator {
        fail: AtomicBool,
    }

    impl MockGenerator {
        fn ok() -> Self {
            Self {
                fail: AtomicBool::new(false),
            }
        }

        fn failing() -> Self {
            Self {
                fail: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for MockGenerator {
        async fn generate(&self, prompt: &str) -> ora_core::Result<String> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ora_core::Error::Generation("provider offline".to_string()));
            }
            // Echo a marker plus any dollar figure from the context so
            // grounding assertions can check for it.
            let figure = prompt
                .split_whitespace()
                .find(|w| w.starts_with('$'))
                .unwrap_or("")
                .to_string();
            Ok(format!("Answer based on context: {}", figure))
        }
    }

    fn engine_in(dir: &std::path::Path, generator: MockGenerator) -> RetrievalEngine {
        RetrievalEngine::new(
            Arc::new(MockEmbedder),
            Arc::new(generator),
            Arc::new(VectorIndexStore::new(dir)),
        )
    }

    #[tokio::test]
    async fn test_ingest_counts_match_index() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path(), MockGenerator::ok());

        let count = engine
            .ingest(
                "First page about revenue.\u{c}Second page about weather.".as_bytes(),
                "doc.txt",
            )
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(engine.store.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_document_does_not_touch_index() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path(), MockGenerator::ok());

        engine.ingest(b"real content here", "a.txt").await.unwrap();
        let before = engine.store.len().unwrap();

        let count = engine.ingest(b"   \n ", "empty.txt").await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(engine.store.len().unwrap(), before);
    }

    #[tokio::test]
    async fn test_query_before_ingestion_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path(), MockGenerator::ok());

        let answer = engine.query("anything").await.unwrap();
        assert_eq!(answer.summary, NOT_READY_MESSAGE);
        assert!(answer.raw_results.is_empty());
    }

    #[tokio::test]
    async fn test_quarterly_revenue_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path(), MockGenerator::ok());

        let doc = "Company overview and history.\u{c}\
                   Headcount grew over the year.\u{c}\
                   Quarterly revenue was $4.2M this period.";
        engine.ingest(doc.as_bytes(), "report.pdf").await.unwrap();

        let answer = engine.query("What was quarterly revenue?").await.unwrap();
        let top = &answer.raw_results[0];
        assert!(top.contains("$4.2M"), "top result was: {}", top);
        assert!(top.contains("[Source: report.pdf, Page: 3]"));
        assert!(answer.summary.contains("$4.2M"));
    }

    #[tokio::test]
    async fn test_retrieved_chunks_are_exact_stored_text() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path(), MockGenerator::ok());

        let page = "Rust guarantees memory safety without garbage collection.";
        engine.ingest(page.as_bytes(), "notes.txt").await.unwrap();

        let answer = engine.query("tell me about rust").await.unwrap();
        assert!(
            answer
                .raw_results
                .iter()
                .any(|r| r.ends_with(page)),
            "results: {:?}",
            answer.raw_results
        );
    }

    #[tokio::test]
    async fn test_generation_failure_degrades_to_cited_context() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path(), MockGenerator::failing());

        engine
            .ingest(b"Quarterly revenue was $4.2M.", "report.pdf")
            .await
            .unwrap();

        let answer = engine.query("What was quarterly revenue?").await.unwrap();
        assert!(answer.summary.contains("generation failed"));
        assert!(answer.summary.contains("$4.2M"));
        assert!(answer.summary.contains("[Source: report.pdf"));
    }
}
