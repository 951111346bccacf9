//! Gemini API integration for ORA
//!
//! One HTTP client implementing both the `TextGenerator` and `Embedder`
//! capability traits against the Generative Language API.

pub mod client;
pub mod config;

pub use client::GeminiClient;
pub use config::GeminiConfig;
