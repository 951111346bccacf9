//! Error types for the ORA knowledge assistant

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the ORA system
///
/// The provider family (`Generation`, `Embedding`, `SourceUnavailable`)
/// is always handled locally with a degraded result and never reaches
/// the end user. `Consistency` is the one unrecoverable class: it means
/// the index and its metadata have diverged and any answer built from
/// them would carry wrong citations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("snippet source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("could not parse model output: {0}")]
    Parse(String),

    #[error("knowledge index is not ready: no documents have been ingested")]
    IndexNotReady,

    #[error("index consistency violation: {0}")]
    Consistency(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error belongs to the provider-failure family that
    /// components degrade around instead of propagating.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::Generation(_)
                | Error::Embedding(_)
                | Error::SourceUnavailable(_)
                | Error::Network(_)
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}
