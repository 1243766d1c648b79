//! Core types — conversation turns, sessions, and the chat-completions
//! wire format.
//!
//! Two message shapes exist on purpose: `Turn` is what the session store
//! records (role + content + timestamp), `Message` is what goes over the
//! wire to an OpenAI-compatible `/chat/completions` endpoint (role +
//! content only). A `Turn` converts to a `Message` when a request is built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────

/// Who authored a message or turn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

// ─────────────────────────────────────────────
// Wire messages (OpenAI chat completions format)
// ─────────────────────────────────────────────

/// A chat message in the completions API format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Session turns
// ─────────────────────────────────────────────

/// One recorded turn in a conversation session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Turn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Turn::new(Role::User, content)
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Turn::new(Role::Assistant, content)
    }

    /// Strip the timestamp for the wire format.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

// ─────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────

/// A conversation session with ordered turn history.
///
/// Owned exclusively by the `SessionStore`; callers only ever see clones.
/// Turns are never reordered or deduplicated, and `last_active_at` never
/// moves backwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// Create a new empty session.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Session {
            id: id.into(),
            turns: Vec::new(),
            created_at: now,
            last_active_at: now,
        }
    }

    /// Whether the session has been idle longer than `timeout`.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now - self.last_active_at > timeout
    }
}

// ─────────────────────────────────────────────
// Chat completion request / response
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Raw chat completion response, used for deserialization only.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<UsageInfo>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantReply,
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantReply {
    pub content: Option<String>,
}

/// Token usage statistics from the completion service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("Hello, world!");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hello, world!");
    }

    #[test]
    fn test_system_message_serialization() {
        let msg = Message::system("You are a helpful assistant.");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "You are a helpful assistant.");
    }

    #[test]
    fn test_message_deserialization() {
        let json = json!({"role": "assistant", "content": "The answer is 4."});
        let msg: Message = serde_json::from_value(json).unwrap();

        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "The answer is 4.");
    }

    #[test]
    fn test_turn_to_message_drops_timestamp() {
        let turn = Turn::user("hi");
        let msg = turn.to_message();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hi");

        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("timestamp").is_none());
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new("sess-1");
        assert_eq!(session.id, "sess-1");
        assert!(session.turns.is_empty());
        assert_eq!(session.created_at, session.last_active_at);
    }

    #[test]
    fn test_session_expiry() {
        let session = Session::new("sess-1");
        let timeout = chrono::Duration::minutes(30);

        assert!(!session.is_expired(Utc::now(), timeout));
        assert!(session.is_expired(Utc::now() + chrono::Duration::minutes(31), timeout));
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatCompletionRequest {
            model: "openai/gpt-4o-mini".to_string(),
            messages: vec![Message::system("Be helpful."), Message::user("Hello")],
            max_tokens: Some(1024),
            temperature: Some(0.7),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "openai/gpt-4o-mini");
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["temperature"], 0.7);
    }

    #[test]
    fn test_chat_request_omits_absent_params() {
        let request = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![Message::user("x")],
            max_tokens: None,
            temperature: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_chat_response_parsing() {
        let api_json = json!({
            "id": "chatcmpl-abc123",
            "choices": [{
                "message": { "content": "Hello! How can I help?" },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 8,
                "total_tokens": 18
            }
        });

        let resp: ChatCompletionResponse = serde_json::from_value(api_json).unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(
            resp.choices[0].message.content.as_deref(),
            Some("Hello! How can I help?")
        );
        assert_eq!(resp.usage.unwrap().total_tokens, 18);
    }

    #[test]
    fn test_chat_response_empty_choices() {
        let api_json = json!({ "id": "chatcmpl-empty", "choices": [], "usage": null });
        let resp: ChatCompletionResponse = serde_json::from_value(api_json).unwrap();
        assert!(resp.choices.is_empty());
    }

    #[test]
    fn test_turn_round_trip() {
        let turns = vec![Turn::user("What is 2+2?"), Turn::assistant("4")];
        let json_str = serde_json::to_string(&turns).unwrap();
        let deserialized: Vec<Turn> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(turns, deserialized);
    }
}
