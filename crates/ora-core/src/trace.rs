//! Trace records and the append-only trace sink

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, RoutingDecision, SourceName};

/// A source that was selected by the router but dropped from the
/// answer, with the cause (timeout or provider failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub source: SourceName,
    pub cause: String,
}

/// One observability record per answered query.
///
/// Records are append-only; the sink owns durability, the controller
/// only produces them. `skipped_sources` defaults to empty so records
/// written before the field existed still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub decision: RoutingDecision,
    pub agents_used: Vec<SourceName>,
    #[serde(default)]
    pub skipped_sources: Vec<SkippedSource>,
    pub retrieved_docs: Vec<String>,
    pub final_answer: String,
}

/// Trait for trace-log sinks
#[async_trait]
pub trait TraceSink: Send + Sync {
    /// Append one record to the log
    async fn append(&self, record: &TraceRecord) -> Result<()>;

    /// Read every stored record, oldest first
    async fn read_all(&self) -> Result<Vec<TraceRecord>>;
}
