//! HTTP provider for OpenAI-compatible chat-completions APIs.
//!
//! Covers OpenRouter (the default deployment) and anything else that
//! exposes a `/chat/completions` endpoint. Every failure mode — transport
//! error, timeout, non-2xx status, unparseable body, empty choices, blank
//! reply — surfaces as `ChatError::UpstreamUnavailable` so the engine has
//! exactly one upstream failure to reason about.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, warn};

use adpulse_core::config::CompletionConfig;
use adpulse_core::error::ChatError;
use adpulse_core::types::{ChatCompletionRequest, ChatCompletionResponse, Message};

use crate::traits::{CompletionParams, CompletionProvider};

/// Replies beyond this are clipped — a runaway upstream should not be
/// able to flood session history.
const MAX_REPLY_CHARS: usize = 10_000;

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A completion provider that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled, bounded timeout).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://openrouter.ai/api/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Default model for this provider instance.
    default_model: String,
    /// Extra headers to send with each request.
    extra_headers: HeaderMap,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider from a completion config.
    pub fn new(config: &CompletionConfig) -> Self {
        let mut extra_headers = HeaderMap::new();
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                if let (Ok(name), Ok(val)) = (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    extra_headers.insert(name, val);
                } else {
                    warn!("Invalid header: {}={}", key, value);
                }
            }
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        HttpProvider {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            default_model: config.model.clone(),
            extra_headers,
        }
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        params: &CompletionParams,
    ) -> Result<String, ChatError> {
        debug!(
            model = %model,
            messages = messages.len(),
            "calling completion service"
        );

        let request_body = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            max_tokens: Some(params.max_tokens),
            temperature: Some(params.temperature),
        };

        let url = self.completions_url();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .headers(self.extra_headers.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "completion request failed");
                if e.is_timeout() {
                    ChatError::upstream("request timed out")
                } else {
                    ChatError::upstream(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!(status = %status, body = %body, "completion API error");
            return Err(ChatError::upstream(format!("status {status}")));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse completion response");
            ChatError::upstream(format!("malformed response: {e}"))
        })?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                error!("completion response had no usable content");
                ChatError::upstream("empty reply")
            })?;

        debug!(reply_len = reply.len(), "completion received");
        Ok(clip_reply(reply))
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn display_name(&self) -> &str {
        "OpenAI-compatible HTTP"
    }
}

/// Clip an oversized reply, marking the cut.
fn clip_reply(reply: String) -> String {
    if reply.chars().count() <= MAX_REPLY_CHARS {
        return reply;
    }
    warn!(chars = reply.chars().count(), "clipping oversized reply");
    let clipped: String = reply.chars().take(MAX_REPLY_CHARS).collect();
    format!("{clipped}...[truncated]")
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build an `HttpProvider` from config, failing fast when no API key is
/// configured — better a startup error than a guaranteed upstream failure
/// on the first message.
pub fn create_provider(config: &CompletionConfig) -> anyhow::Result<HttpProvider> {
    if !config.is_configured() {
        anyhow::bail!(
            "No completion API key configured. \
             Set OPENROUTER_API_KEY or completion.apiKey in the config file."
        );
    }

    debug!(
        api_base = %config.api_base,
        model = %config.model,
        "creating completion provider"
    );

    Ok(HttpProvider::new(config))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
