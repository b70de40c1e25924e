use super::common::*;
use axum::http::StatusCode;
use rag_chat_gateway::usecase::ChatResult;
use serde_json::{json, Value};
use test_log::test;

async fn stream(result: ChatResult) -> (StatusCode, Vec<String>, Harness) {
    let h = harness(MockUseCase::returning(result));
    let response = h
        .gateway
        .handle(
            RequestBuilder::new()
                .api_key()
                .body(chat_body("tell me", Some(true)))
                .build(),
        )
        .await;
    assert!(response.is_event_stream());
    assert_eq!(response.header("content-type"), Some("text/event-stream"));
    assert_eq!(response.header("cache-control"), Some("no-cache"));
    assert!(response.header("connection").is_none());
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    let payloads = sse_payloads(&response.body_bytes());
    (response.status, payloads, h)
}

fn parse(payload: &str) -> Value {
    serde_json::from_str(payload).unwrap()
}

#[test(tokio::test)]
async fn long_answer_streams_in_fifty_char_pieces() {
    let content = "a".repeat(120);
    let result = ChatResult::new("conv_7", "agent-support", content.clone())
        .with_citations(vec!["https://kb.example.com/1".into(), "https://kb.example.com/2".into()], true);
    let (status, payloads, h) = stream(result).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payloads.len(), 5);
    assert_eq!(payloads[4], "[DONE]");

    let events: Vec<Value> = payloads[..4].iter().map(|p| parse(p)).collect();
    let pieces: Vec<&str> = events[..3]
        .iter()
        .map(|e| e["choices"][0]["delta"]["content"].as_str().unwrap())
        .collect();
    assert_eq!(pieces.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![50, 50, 20]);
    assert_eq!(pieces.concat(), content);

    assert_eq!(events[3]["choices"][0]["finish_reason"], "stop");
    assert_eq!(
        events[3]["choices"][0]["delta"],
        json!({
            "cited_urls": ["https://kb.example.com/1", "https://kb.example.com/2"],
            "isRag": true
        })
    );
    for event in &events {
        assert_eq!(event["id"], "conv_7");
        assert_eq!(event["object"], "chat.completion.chunk");
        assert_eq!(event["model"], "agent-support");
        assert_eq!(event["choices"][0]["index"], 0);
    }

    assert!(h.logger.find("Streaming chat response generated").is_some());
    assert_eq!(h.logger.responses.lock()[0].status_code, Some(200));
}

#[test(tokio::test)]
async fn empty_answer_streams_one_empty_piece() {
    let (status, payloads, _) = stream(ChatResult::new("conv_8", "agent-support", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payloads.len(), 3);
    let first = parse(&payloads[0]);
    assert_eq!(first["choices"][0]["delta"]["content"], "");
    assert!(first["choices"][0]["finish_reason"].is_null());

    let last = parse(&payloads[1]);
    assert_eq!(last["choices"][0]["finish_reason"], "stop");
    assert_eq!(
        last["choices"][0]["delta"],
        json!({ "cited_urls": [], "isRag": false })
    );
    assert_eq!(payloads[2], "[DONE]");
}

#[test(tokio::test)]
async fn multibyte_answer_round_trips() {
    let content = "Los reembolsos tardan cinco días hábiles. 返金は5営業日以内です。 ✅".repeat(3);
    let (_, payloads, _) = stream(ChatResult::new("conv_9", "agent-support", content.clone())).await;

    let rebuilt: String = payloads
        .iter()
        .filter(|p| p.as_str() != "[DONE]")
        .map(|p| parse(p))
        .filter_map(|e| e["choices"][0]["delta"]["content"].as_str().map(str::to_string))
        .collect();
    assert_eq!(rebuilt, content);
}

#[test(tokio::test)]
async fn use_case_failure_never_starts_a_stream() {
    let h = harness(MockUseCase::failing("generation timed out"));
    let response = h
        .gateway
        .handle(
            RequestBuilder::new()
                .api_key()
                .body(chat_body("hi", Some(true)))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.is_event_stream());
    assert_eq!(response.header("content-type"), Some("application/json"));
}
