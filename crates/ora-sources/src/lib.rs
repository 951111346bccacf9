//! External snippet sources for ORA
//!
//! Thin single-call clients behind the `SnippetSource` trait: a web
//! search source and an academic (arXiv) source. Everything interesting
//! about how their results are used lives in `ora-agents`.

pub mod arxiv;
pub mod web;

pub use arxiv::ArxivSource;
pub use web::DuckDuckGoSource;
