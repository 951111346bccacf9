//! Retrieval engine for ORA
//!
//! Turns documents into an on-disk vector index and answers queries with
//! citation-grounded context: extraction, overlapping chunking, batch
//! embedding, flat L2 nearest-neighbor search, and grounded generation.

pub mod chunker;
pub mod engine;
pub mod vector_store;

pub use chunker::{extract_pages, split_text, PageText};
pub use engine::{
    RetrievalAnswer, RetrievalConfig, RetrievalEngine, NO_MATCH_MESSAGE, NOT_READY_MESSAGE,
};
pub use vector_store::{Hit, SearchOutcome, VectorIndexStore};
