//! Error taxonomy for the chat engine.
//!
//! Four kinds cover every failure the engine surfaces. Each carries a
//! stable machine-readable tag (`kind()`) plus a human-readable message,
//! so the transport layer can map them to status codes without string
//! matching. Nothing here is retried internally — retry policy belongs
//! to the caller.

use thiserror::Error;

/// Every error the chat engine can return to a caller.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Input failed validation: empty/whitespace message, oversized
    /// message or session id, empty comment batch.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Admission denied by the rate limiter. `retry_after_secs` is the
    /// time until a token would be available again.
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// An explicit lookup (history, delete-style operations) named a
    /// session that does not exist. `send` never returns this for an
    /// unknown id — it adopts the id instead.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The completion service timed out, returned a non-success status,
    /// or sent a payload we could not use. Transport, HTTP, and parse
    /// failures all collapse into this one kind.
    #[error("completion service unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl ChatError {
    /// Stable tag for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::InvalidInput(_) => "invalid_input",
            ChatError::RateLimited { .. } => "rate_limited",
            ChatError::NotFound(_) => "not_found",
            ChatError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }

    /// Shorthand for an `InvalidInput` error.
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        ChatError::InvalidInput(detail.into())
    }

    /// Shorthand for a `NotFound` error naming the missing session.
    pub fn not_found(session_id: impl Into<String>) -> Self {
        ChatError::NotFound(session_id.into())
    }

    /// Shorthand for an `UpstreamUnavailable` error.
    pub fn upstream(detail: impl Into<String>) -> Self {
        ChatError::UpstreamUnavailable(detail.into())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_stable() {
        assert_eq!(ChatError::invalid_input("x").kind(), "invalid_input");
        assert_eq!(
            ChatError::RateLimited { retry_after_secs: 3 }.kind(),
            "rate_limited"
        );
        assert_eq!(ChatError::not_found("abc").kind(), "not_found");
        assert_eq!(ChatError::upstream("x").kind(), "upstream_unavailable");
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ChatError::invalid_input("message cannot be empty");
        assert_eq!(err.to_string(), "invalid input: message cannot be empty");

        let err = ChatError::not_found("sess-42");
        assert_eq!(err.to_string(), "session not found: sess-42");
    }

    #[test]
    fn test_rate_limited_carries_retry_hint() {
        let err = ChatError::RateLimited { retry_after_secs: 12 };
        assert!(err.to_string().contains("12s"));
    }
}
