//! Orchestration layer for ORA
//!
//! Routing decisions, concurrent dispatch to knowledge agents, answer
//! synthesis, and the controller that ties them together behind one
//! `answer()` call with a trace record per request.

pub mod agents;
pub mod controller;
pub mod dispatcher;
pub mod router;
pub mod synthesizer;
pub mod trace;

pub use agents::{AcademicAgent, DocumentAgent, WebAgent};
pub use controller::Controller;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use router::{Router, RoutingPolicy};
pub use synthesizer::{Synthesizer, NO_SOURCES_MESSAGE};
pub use trace::{JsonlTraceSink, MemoryTraceSink};
