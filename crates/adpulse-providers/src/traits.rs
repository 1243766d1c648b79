//! Completion provider trait — the seam between the chat engine and the
//! external text-generation service.

use adpulse_core::error::ChatError;
use adpulse_core::types::Message;
use async_trait::async_trait;

/// Sampling parameters passed with each completion call.
#[derive(Clone, Debug)]
pub struct CompletionParams {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Trait every completion backend implements.
///
/// The upstream is untrusted and unreliable: implementations must map
/// transport errors, timeouts, non-success statuses, and unusable
/// payloads uniformly to `ChatError::UpstreamUnavailable` rather than
/// inventing their own failure shapes.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request one reply for an ordered list of role-tagged messages.
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        params: &CompletionParams,
    ) -> Result<String, ChatError>;

    /// The default model for this provider instance.
    fn default_model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
