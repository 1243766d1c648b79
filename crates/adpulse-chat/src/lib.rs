//! Conversation orchestration for Adpulse.
//!
//! `ChatEngine` ties the core pieces together: it validates a user turn,
//! runs admission control, resolves the session, calls the completion
//! service, and records both sides of the exchange. The sentiment module
//! adds the batch-analysis path on top of the same engine.

pub mod engine;
pub mod sentiment;

pub use engine::{ChatEngine, ChatReply};
pub use sentiment::AnalysisReply;
