//! Core engine for Adpulse — the session, rate-limit, and configuration
//! layer behind the sentiment-assistant chat API.
//!
//! This crate owns all local state: conversation sessions (in-memory,
//! process-lifetime only), per-client admission control, and the typed
//! error taxonomy every layer above speaks. The HTTP transport and the
//! completion service itself live elsewhere.

pub mod config;
pub mod error;
pub mod ratelimit;
pub mod session;
pub mod types;

pub use error::ChatError;
