use crate::usecase::ChatMessage;
use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};

pub const INVALID_JSON_MESSAGE: &str = "Request body must be valid JSON";
pub const INVALID_STREAM_MESSAGE: &str = "stream must be a boolean";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// A client sent something we will not dispatch. The message goes back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

static CHAT_REQUEST_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["model", "messages"],
        "properties": {
            "model": { "type": "string", "minLength": 1 },
            "messages": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["role", "content"],
                    "properties": {
                        "role": { "enum": ["system", "user", "assistant"] },
                        "content": { "type": "string" }
                    }
                }
            }
        }
    })
});

static CHAT_REQUEST_VALIDATOR: Lazy<Validator> = Lazy::new(|| {
    jsonschema::validator_for(&CHAT_REQUEST_SCHEMA).expect("chat request schema must compile")
});

/// A chat request that passed validation: at least one message, non-empty agent id.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub agent_id: String,
    pub messages: Vec<ChatMessage>,
    pub stream_requested: bool,
}

#[derive(Deserialize)]
struct ChatRequestBody {
    model: String,
    messages: Vec<ChatMessage>,
}

/// Parses and validates a raw request body.
///
/// Checks run in a fixed order: JSON syntax, then the `stream` flag, then the
/// schema. A body that fails more than one check reports the earliest.
pub fn validate_chat_request(raw_body: Option<&str>) -> Result<ChatRequest, ValidationError> {
    let raw_body = raw_body.filter(|b| !b.trim().is_empty()).unwrap_or("{}");

    let mut payload: Value =
        serde_json::from_str(raw_body).map_err(|_| ValidationError::new(INVALID_JSON_MESSAGE))?;

    let stream_requested = extract_stream_flag(&mut payload)?;

    if let Some(violation) = CHAT_REQUEST_VALIDATOR.iter_errors(&payload).next() {
        let message = violation.to_string();
        return Err(ValidationError::new(if message.is_empty() {
            INVALID_BODY_MESSAGE.to_string()
        } else {
            message
        }));
    }

    let body: ChatRequestBody =
        serde_json::from_value(payload).map_err(|_| ValidationError::new(INVALID_BODY_MESSAGE))?;

    Ok(ChatRequest {
        agent_id: body.model,
        messages: body.messages,
        stream_requested,
    })
}

/// Removes `stream` from the payload; absent means `false`.
fn extract_stream_flag(payload: &mut Value) -> Result<bool, ValidationError> {
    let Some(object) = payload.as_object_mut() else {
        return Ok(false);
    };
    match object.remove("stream") {
        None => Ok(false),
        Some(Value::Bool(flag)) => Ok(flag),
        Some(_) => Err(ValidationError::new(INVALID_STREAM_MESSAGE)),
    }
}
