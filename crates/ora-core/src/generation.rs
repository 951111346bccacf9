//! Capability traits for text generation and embedding

use async_trait::async_trait;

use crate::Result;

/// Trait for text-generation providers (e.g. Gemini, WatsonX)
///
/// Implementations wrap one prompt-in, text-out call. A failed call
/// returns `Error::Generation`; callers are expected to degrade rather
/// than surface the failure.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for the given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Trait for embedding providers
///
/// All vectors produced by one call share the same dimensionality, and
/// one provider instance must keep that dimensionality stable across
/// calls: the vector index it feeds is built on it.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts into fixed-length vectors, one per input
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
