//! Core traits and types for ORA (orchestrated retrieval assistant)
//!
//! This crate defines the fundamental traits and types used across the ORA
//! system. It provides capability-facing interfaces for text generation,
//! embedding, external snippet sources, knowledge agents, and trace sinks,
//! making the system test-friendly and extensible.

pub mod agent;
pub mod error;
pub mod generation;
pub mod snippet;
pub mod trace;
pub mod types;

pub use agent::{KnowledgeAgent, KnowledgeResult};
pub use error::{Error, Result};
pub use generation::{Embedder, TextGenerator};
pub use snippet::{Snippet, SnippetSource};
pub use trace::{SkippedSource, TraceRecord, TraceSink};
pub use types::*;
