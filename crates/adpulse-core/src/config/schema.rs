//! Configuration schema.
//!
//! Two sections: `completion` (the external service: endpoint, model,
//! sampling parameters, timeout) and `chat` (engine policy: session
//! expiry, message limits, admission rate).
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.adpulse/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub completion: CompletionConfig,
    pub chat: ChatConfig,
}

// ─────────────────────────────────────────────
// Completion service
// ─────────────────────────────────────────────

/// Settings for the external completion service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    /// API key for Bearer authentication.
    #[serde(default)]
    pub api_key: String,
    /// OpenAI-compatible API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens to generate per reply.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Upper bound on one upstream round trip, in seconds.
    pub request_timeout_seconds: u64,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

fn default_api_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            max_tokens: 1024,
            temperature: 0.7,
            request_timeout_seconds: 30,
            extra_headers: None,
        }
    }
}

impl CompletionConfig {
    /// Whether an API key has been configured.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Chat engine policy
// ─────────────────────────────────────────────

/// Engine policy: session lifetime, input limits, admission rate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Idle minutes before a session is eligible for sweep.
    pub session_timeout_minutes: u32,
    /// Maximum user message length in characters.
    pub max_message_chars: usize,
    /// Maximum caller-supplied session id length in characters.
    pub max_session_id_chars: usize,
    /// Token-bucket capacity: messages per client per minute.
    pub rate_limit_per_minute: u32,
    /// Maximum comments accepted per analysis request.
    pub max_comments: usize,
    /// Maximum steering-query length in characters.
    pub max_query_chars: usize,
    /// System instruction prepended to every completion request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_system_prompt() -> String {
    "You are Adpulse's assistant. You help users understand social media \
     sentiment analysis, interpret comment data, and provide actionable \
     insights based on analyzed comments.\n\n\
     Guidelines:\n\
     - Be helpful, concise, and give specific examples when relevant\n\
     - Format responses in clear paragraphs or bullet points\n\
     - Avoid harmful, biased, or inappropriate content\n\
     - Focus on objective analysis and insights\n\
     - Keep a professional tone"
        .to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            session_timeout_minutes: 30,
            max_message_chars: 5000,
            max_session_id_chars: 500,
            rate_limit_per_minute: 20,
            max_comments: 100,
            max_query_chars: 1000,
            system_prompt: default_system_prompt(),
        }
    }
}

impl ChatConfig {
    /// Session idle timeout as a `chrono::Duration`.
    pub fn session_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_timeout_minutes as i64)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
