//! The chat engine — validation, admission, session resolution, upstream
//! call, and history recording for one user turn.
//!
//! Ordering contract: the user turn is appended before the upstream call
//! and stays recorded even when that call fails, so a dropped reply is
//! visible in history rather than silently losing the user's message.
//! No session lock is held across the upstream round trip — the store's
//! per-session critical section covers local mutation only.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use adpulse_core::config::Config;
use adpulse_core::error::ChatError;
use adpulse_core::ratelimit::{Admission, RateLimiter};
use adpulse_core::session::SessionStore;
use adpulse_core::types::{Message, Role, Turn};
use adpulse_providers::traits::{CompletionParams, CompletionProvider};

/// Result of a successful `send`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatReply {
    /// The session the exchange was recorded under (minted if the caller
    /// supplied none).
    pub session_id: String,
    /// The assistant's reply text.
    pub reply: String,
}

// ─────────────────────────────────────────────
// ChatEngine
// ─────────────────────────────────────────────

/// Orchestrates one conversation turn end to end.
pub struct ChatEngine {
    sessions: Arc<SessionStore>,
    limiter: RateLimiter,
    provider: Arc<dyn CompletionProvider>,
    model: String,
    params: CompletionParams,
    system_prompt: String,
    max_message_chars: usize,
    max_session_id_chars: usize,
    max_comments: usize,
    max_query_chars: usize,
}

impl ChatEngine {
    /// Build an engine from config and a completion provider.
    pub fn new(config: &Config, provider: Arc<dyn CompletionProvider>) -> Self {
        let sessions = Arc::new(SessionStore::new(config.chat.session_timeout()));
        let limiter = RateLimiter::per_minute(config.chat.rate_limit_per_minute);
        let params = CompletionParams {
            max_tokens: config.completion.max_tokens,
            temperature: config.completion.temperature,
        };

        info!(
            model = %config.completion.model,
            rate_limit = config.chat.rate_limit_per_minute,
            session_timeout_minutes = config.chat.session_timeout_minutes,
            "chat engine initialized"
        );

        Self {
            sessions,
            limiter,
            provider,
            model: config.completion.model.clone(),
            params,
            system_prompt: config.chat.system_prompt.clone(),
            max_message_chars: config.chat.max_message_chars,
            max_session_id_chars: config.chat.max_session_id_chars,
            max_comments: config.chat.max_comments,
            max_query_chars: config.chat.max_query_chars,
        }
    }

    /// The session store (shared, e.g. with a background sweeper).
    pub fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }

    pub(crate) fn max_comments(&self) -> usize {
        self.max_comments
    }

    pub(crate) fn max_query_chars(&self) -> usize {
        self.max_query_chars
    }

    /// Send one user message and return the assistant's reply.
    ///
    /// An absent or unknown `session_id` is adopted, not rejected; the
    /// caller gets the (possibly minted) id back for the next turn.
    /// Identical messages are never deduplicated — every call appends.
    pub async fn send(
        &self,
        session_id: Option<&str>,
        message: &str,
        client_id: &str,
    ) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::invalid_input("message cannot be empty"));
        }
        if message.chars().count() > self.max_message_chars {
            return Err(ChatError::invalid_input(format!(
                "message too long (max {} characters)",
                self.max_message_chars
            )));
        }
        self.validate_session_id(session_id)?;

        match self.limiter.admit(client_id, Instant::now()) {
            Admission::Allowed => {}
            Admission::Denied { retry_after_secs } => {
                warn!(client_id = %client_id, "rate limit exceeded");
                return Err(ChatError::RateLimited { retry_after_secs });
            }
        }

        // Opportunistic expiry sweep so idle sessions don't accumulate.
        self.sessions.sweep(Utc::now());

        let session = self.sessions.get_or_create(session_id)?;
        let session_id = session.id;

        debug!(session_id = %session_id, client_id = %client_id, "processing message");

        self.sessions.append(&session_id, Role::User, message)?;

        // Snapshot the history, then call upstream with nothing locked.
        let wire = self.build_messages(&self.sessions.history(&session_id)?);
        let reply = self
            .provider
            .complete(&wire, &self.model, &self.params)
            .await?;

        self.sessions.append(&session_id, Role::Assistant, &reply)?;

        info!(
            session_id = %session_id,
            reply_len = reply.len(),
            "turn completed"
        );

        Ok(ChatReply { session_id, reply })
    }

    /// Ordered history for a session; `NotFound` if it doesn't exist.
    ///
    /// Unlike `send`, an unknown id here is an error — explicit lookups
    /// never adopt.
    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        self.sessions.history(session_id)
    }

    /// Delete a session; returns whether it existed.
    pub fn delete_session(&self, session_id: &str) -> bool {
        self.sessions.delete(session_id)
    }

    /// Run one completion over an explicit message list (used by the
    /// sentiment path for session-less analysis).
    pub(crate) async fn complete_oneshot(&self, user_content: &str) -> Result<String, ChatError> {
        let wire = vec![
            Message::system(&self.system_prompt),
            Message::user(user_content),
        ];
        self.provider.complete(&wire, &self.model, &self.params).await
    }

    /// Run a session-backed turn without validation or rate limiting
    /// (the sentiment path validates its own inputs).
    pub(crate) async fn exchange_in_session(
        &self,
        session_id: &str,
        user_content: &str,
    ) -> Result<String, ChatError> {
        self.sessions.get_or_create(Some(session_id))?;
        self.sessions.append(session_id, Role::User, user_content)?;

        let wire = self.build_messages(&self.sessions.history(session_id)?);
        let reply = self
            .provider
            .complete(&wire, &self.model, &self.params)
            .await?;

        self.sessions.append(session_id, Role::Assistant, &reply)?;
        Ok(reply)
    }

    pub(crate) fn validate_session_id(&self, session_id: Option<&str>) -> Result<(), ChatError> {
        if let Some(id) = session_id {
            if id.chars().count() > self.max_session_id_chars {
                return Err(ChatError::invalid_input(format!(
                    "session_id too long (max {} characters)",
                    self.max_session_id_chars
                )));
            }
        }
        Ok(())
    }

    /// System prompt followed by the full ordered history.
    fn build_messages(&self, history: &[Turn]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(history.iter().map(Turn::to_message));
        messages
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
