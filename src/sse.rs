//! Server-sent event framing for chat completions.
//!
//! The use case returns one complete result; this module splits its content
//! into fixed-size pieces and renders each as a `chat.completion.chunk`
//! event, followed by a terminal event carrying citations and the
//! `[DONE]` sentinel. Nothing here touches HTTP.

use crate::usecase::ChatResult;
use bytes::Bytes;
use serde_json::{json, Value};

/// Characters of content per event.
pub const STREAM_CHUNK_SIZE: usize = 50;

pub const CHUNK_OBJECT: &str = "chat.completion.chunk";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Splits `content` into consecutive pieces of at most `chunk_size` characters.
///
/// Empty content yields a single empty piece so every stream carries at
/// least one content event. Pieces never split a character.
pub fn split_into_chunks(content: &str, chunk_size: usize) -> Vec<&str> {
    if content.is_empty() {
        return vec![""];
    }
    let chunk_size = chunk_size.max(1);

    let mut chunks = Vec::with_capacity(content.len() / chunk_size + 1);
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in content.char_indices() {
        if count == chunk_size {
            chunks.push(&content[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&content[start..]);
    chunks
}

#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Data(Value),
    Done,
}

impl SseFrame {
    /// Wire form: `data: <payload>` and a blank line.
    pub fn encode(&self) -> Bytes {
        match self {
            SseFrame::Data(payload) => Bytes::from(format!("data: {}\n\n", payload)),
            SseFrame::Done => Bytes::from(format!("data: {}\n\n", DONE_SENTINEL)),
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            SseFrame::Data(payload) => Some(payload),
            SseFrame::Done => None,
        }
    }
}

fn chunk_event(result: &ChatResult, delta: Value, finish_reason: Option<&str>) -> SseFrame {
    SseFrame::Data(json!({
        "id": result.id(),
        "object": CHUNK_OBJECT,
        "model": result.model(),
        "choices": [{
            "index": 0,
            "delta": delta,
            "finish_reason": finish_reason,
        }],
    }))
}

/// Renders a complete result as its ordered event sequence.
pub fn build_completion_frames(result: &ChatResult, chunk_size: usize) -> Vec<SseFrame> {
    let pieces = split_into_chunks(result.content(), chunk_size);
    let mut frames = Vec::with_capacity(pieces.len() + 2);

    for piece in pieces {
        frames.push(chunk_event(result, json!({ "content": piece }), None));
    }

    frames.push(chunk_event(
        result,
        json!({
            "cited_urls": result.cited_urls(),
            "isRag": result.is_rag(),
        }),
        Some("stop"),
    ));
    frames.push(SseFrame::Done);
    frames
}
