//! Completion-service clients for Adpulse.
//!
//! One trait (`CompletionProvider`) and one real implementation
//! (`HttpProvider`) that speaks to any OpenAI-compatible
//! `/chat/completions` endpoint — OpenRouter in the default deployment.

pub mod http_provider;
pub mod traits;

pub use http_provider::{create_provider, HttpProvider};
pub use traits::{CompletionParams, CompletionProvider};
