//! Batch sentiment analysis — packages a set of external comments plus an
//! optional steering query into a single completion request.
//!
//! Unlike the chat path, this one is session-less by default: nothing is
//! persisted unless the caller supplies a session id, and even then only
//! the synthesized prompt/reply pair is appended, never the individual
//! comments.

use tracing::{info, warn};

use adpulse_core::error::ChatError;

use crate::engine::ChatEngine;

/// How many comments are quoted verbatim in the prompt.
const SAMPLE_SIZE: usize = 5;
/// Each quoted comment is clipped to this many characters.
const SAMPLE_CLIP_CHARS: usize = 100;
/// A comment longer than this is skipped as invalid.
const MAX_COMMENT_CHARS: usize = 5000;

/// Result of a batch analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisReply {
    /// Session the exchange was recorded under, if the caller asked for one.
    pub session_id: Option<String>,
    /// The assistant's analysis text.
    pub reply: String,
    /// Number of comments that survived validation.
    pub comment_count: usize,
    /// Number of comments quoted in the prompt.
    pub sample_count: usize,
}

impl ChatEngine {
    /// Analyze a batch of comments, optionally steered by `query`.
    ///
    /// Blank and oversized comments are skipped rather than rejected; the
    /// batch as a whole fails with `InvalidInput` only when it is empty,
    /// over the configured size, or nothing in it survives validation.
    pub async fn analyze(
        &self,
        comments: &[String],
        query: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<AnalysisReply, ChatError> {
        if comments.is_empty() {
            return Err(ChatError::invalid_input("at least one comment is required"));
        }
        if comments.len() > self.max_comments() {
            return Err(ChatError::invalid_input(format!(
                "maximum {} comments allowed per request",
                self.max_comments()
            )));
        }

        let valid: Vec<&str> = comments
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                let trimmed = c.trim();
                if trimmed.is_empty() || trimmed.chars().count() > MAX_COMMENT_CHARS {
                    warn!(index = i, "skipping invalid comment");
                    None
                } else {
                    Some(trimmed)
                }
            })
            .collect();

        if valid.is_empty() {
            return Err(ChatError::invalid_input("no valid comments to analyze"));
        }

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        if let Some(q) = query {
            if q.chars().count() > self.max_query_chars() {
                return Err(ChatError::invalid_input(format!(
                    "query too long (max {} characters)",
                    self.max_query_chars()
                )));
            }
        }
        self.validate_session_id(session_id)?;

        let sample_count = valid.len().min(SAMPLE_SIZE);
        let prompt = build_analysis_prompt(&valid, query);

        info!(
            comment_count = valid.len(),
            with_session = session_id.is_some(),
            "sentiment analysis request"
        );

        let (session_id, reply) = match session_id {
            Some(id) => {
                let reply = self.exchange_in_session(id, &prompt).await?;
                (Some(id.to_string()), reply)
            }
            None => (None, self.complete_oneshot(&prompt).await?),
        };

        Ok(AnalysisReply {
            session_id,
            reply,
            comment_count: valid.len(),
            sample_count,
        })
    }
}

/// Synthesize the analysis prompt: comment count, a clipped sample of the
/// first few comments, the remainder count, and the steering query.
fn build_analysis_prompt(comments: &[&str], query: Option<&str>) -> String {
    let sample_text = comments
        .iter()
        .take(SAMPLE_SIZE)
        .map(|c| format!("  • {}", clip_chars(c, SAMPLE_CLIP_CHARS)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "I have {} comments to analyze.\n\nSample comments:\n{}\n",
        comments.len(),
        sample_text
    );

    if comments.len() > SAMPLE_SIZE {
        prompt.push_str(&format!(
            "\n(Plus {} more comments)\n",
            comments.len() - SAMPLE_SIZE
        ));
    }

    if let Some(q) = query {
        prompt.push_str(&format!("\nUser question: {q}\n"));
    }

    prompt.push_str("\nPlease provide sentiment analysis insights.");
    prompt
}

/// Clip at a character boundary, never mid-codepoint.
fn clip_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{make_engine, MockProvider};
    use adpulse_core::types::Role;

    fn comments(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_analyze_without_session_persists_nothing() {
        let engine = make_engine(MockProvider::simple("mostly positive"));

        let reply = engine
            .analyze(&comments(&["great ad", "loved it"]), None, None)
            .await
            .unwrap();

        assert_eq!(reply.session_id, None);
        assert_eq!(reply.reply, "mostly positive");
        assert_eq!(reply.comment_count, 2);
        assert_eq!(reply.sample_count, 2);
        assert!(engine.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_with_session_appends_prompt_reply_pair_only() {
        let engine = make_engine(MockProvider::simple("mixed"));

        let reply = engine
            .analyze(
                &comments(&["good", "bad", "ugly"]),
                Some("how polarized?"),
                Some("analysis-1"),
            )
            .await
            .unwrap();

        assert_eq!(reply.session_id.as_deref(), Some("analysis-1"));

        // Exactly two turns: the synthesized prompt and the reply — the
        // individual comments are never recorded.
        let history = engine.history("analysis-1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert!(history[0].content.contains("I have 3 comments"));
        assert!(history[0].content.contains("User question: how polarized?"));
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "mixed");
    }

    #[tokio::test]
    async fn test_analyze_empty_batch_rejected() {
        let engine = make_engine(MockProvider::simple("ok"));
        let err = engine.analyze(&[], None, None).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_analyze_oversized_batch_rejected() {
        let engine = make_engine(MockProvider::simple("ok"));
        let batch: Vec<String> = (0..101).map(|i| format!("comment {i}")).collect();
        let err = engine.analyze(&batch, None, None).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_analyze_skips_blank_and_oversized_comments() {
        let engine = make_engine(MockProvider::simple("ok"));
        let huge = "x".repeat(5001);

        let reply = engine
            .analyze(&comments(&["keep me", "   ", &huge]), None, None)
            .await
            .unwrap();
        assert_eq!(reply.comment_count, 1);
    }

    #[tokio::test]
    async fn test_analyze_all_comments_invalid_rejected() {
        let engine = make_engine(MockProvider::simple("ok"));

        let err = engine
            .analyze(&comments(&["", "  \n "]), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_analyze_oversized_query_rejected() {
        let engine = make_engine(MockProvider::simple("ok"));
        let query = "q".repeat(1001);

        let err = engine
            .analyze(&comments(&["fine"]), Some(&query), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_analyze_upstream_failure_propagates() {
        let engine = make_engine(MockProvider::failing("timed out"));

        let err = engine
            .analyze(&comments(&["fine"]), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream_unavailable");
    }

    #[test]
    fn test_prompt_samples_first_five_and_counts_remainder() {
        let all = ["a", "b", "c", "d", "e", "f", "g"];
        let prompt = build_analysis_prompt(&all, None);

        assert!(prompt.starts_with("I have 7 comments to analyze."));
        assert!(prompt.contains("  • a"));
        assert!(prompt.contains("  • e"));
        assert!(!prompt.contains("  • f"));
        assert!(prompt.contains("(Plus 2 more comments)"));
        assert!(prompt.ends_with("Please provide sentiment analysis insights."));
    }

    #[test]
    fn test_prompt_omits_remainder_and_query_when_absent() {
        let prompt = build_analysis_prompt(&["only one"], None);
        assert!(!prompt.contains("more comments"));
        assert!(!prompt.contains("User question"));
    }

    #[test]
    fn test_prompt_clips_long_comments() {
        let long = "y".repeat(300);
        let prompt = build_analysis_prompt(&[long.as_str()], None);
        assert!(prompt.contains(&"y".repeat(100)));
        assert!(!prompt.contains(&"y".repeat(101)));
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        let s = "héllo wörld".repeat(20);
        let clipped = clip_chars(&s, 100);
        assert_eq!(clipped.chars().count(), 100);
    }
}
