//! Contract of the chat use case the gateway dispatches to.
//!
//! The use case performs retrieval and generation and always returns one
//! complete result; only the gateway's response framing streams.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub mod remote;

pub use remote::RemoteChatUseCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// What the gateway hands to the use case once a request is authenticated and valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    pub tenant_id: String,
    pub user_id: String,
    pub agent_id: String,
    pub messages: Vec<ChatMessage>,
    pub request_id: String,
}

/// A chat completion, kept exactly as the backend produced it.
///
/// Only `id`, `model` and the first choice's `content`, `cited_urls` and
/// `isRag` are ever read; the rest of the document, nulls included, is
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ChatResult {
    raw: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidChatResult {
    #[error("chat result must be a JSON object")]
    NotAnObject,

    #[error("chat result is missing a string `{0}` field")]
    MissingField(&'static str),
}

impl TryFrom<Value> for ChatResult {
    type Error = InvalidChatResult;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(raw) = value else {
            return Err(InvalidChatResult::NotAnObject);
        };
        for field in ["id", "model"] {
            if !raw.get(field).is_some_and(Value::is_string) {
                return Err(InvalidChatResult::MissingField(field));
            }
        }
        Ok(Self { raw })
    }
}

impl From<ChatResult> for Value {
    fn from(result: ChatResult) -> Self {
        Value::Object(result.raw)
    }
}

impl ChatResult {
    /// Assistant reply from the single result shape the gateway supports.
    pub fn new(id: impl Into<String>, model: impl Into<String>, content: impl Into<String>) -> Self {
        let content: String = content.into();
        let mut raw = Map::new();
        raw.insert("id".to_string(), Value::String(id.into()));
        raw.insert("object".to_string(), json!("chat.completion"));
        raw.insert("model".to_string(), Value::String(model.into()));
        raw.insert(
            "choices".to_string(),
            json!([{
                "index": 0,
                "message": { "role": "assistant", "content": content },
            }]),
        );
        Self { raw }
    }

    pub fn with_citations(mut self, cited_urls: Vec<String>, is_rag: bool) -> Self {
        let message = self
            .raw
            .get_mut("choices")
            .and_then(|choices| choices.get_mut(0))
            .and_then(|choice| choice.get_mut("message"))
            .and_then(Value::as_object_mut);
        if let Some(message) = message {
            message.insert("cited_urls".to_string(), json!(cited_urls));
            message.insert("isRag".to_string(), json!(is_rag));
        }
        self
    }

    fn str_field(&self, name: &str) -> &str {
        self.raw.get(name).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        self.str_field("id")
    }

    pub fn model(&self) -> &str {
        self.str_field("model")
    }

    /// Any top-level field, as the backend sent it.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

    fn first_message(&self) -> Option<&Value> {
        self.raw.get("choices")?.get(0)?.get("message")
    }

    pub fn content(&self) -> &str {
        self.first_message()
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn cited_urls(&self) -> Vec<&str> {
        self.first_message()
            .and_then(|message| message.get("cited_urls"))
            .and_then(Value::as_array)
            .map(|urls| urls.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_rag(&self) -> bool {
        self.first_message()
            .and_then(|message| message.get("isRag"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatUseCaseError {
    #[error("Request to chat backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Chat backend responded with status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Chat backend returned an unreadable result: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait ChatUseCase: Send + Sync {
    async fn execute(&self, input: ChatInput) -> Result<ChatResult, ChatUseCaseError>;
}
