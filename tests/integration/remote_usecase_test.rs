use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use rag_chat_gateway::usecase::{
    ChatInput, ChatMessage, ChatUseCase, ChatUseCaseError, RemoteChatUseCase,
};
use serde_json::{json, Value};
use test_log::test;

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/chat", addr)
}

/// Each test runs its own runtime, so each gets its own connection pool.
fn remote(endpoint: String) -> RemoteChatUseCase {
    RemoteChatUseCase::with_client(endpoint, reqwest::Client::new())
}

fn input() -> ChatInput {
    ChatInput {
        tenant_id: "tenant-1".into(),
        user_id: "user-1".into(),
        agent_id: "agent-support".into(),
        messages: vec![ChatMessage::user("Where is my order?")],
        request_id: "req-remote-1".into(),
    }
}

#[test(tokio::test)]
async fn posts_input_and_decodes_result() {
    let backend = Router::new().route(
        "/chat",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            Json(json!({
                "id": "conv_remote",
                "object": "chat.completion",
                "model": body["agentId"],
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": format!(
                            "{} asked {} via {}",
                            body["userId"].as_str().unwrap_or_default(),
                            body["messages"][0]["content"].as_str().unwrap_or_default(),
                            headers
                                .get("x-request-id")
                                .and_then(|h| h.to_str().ok())
                                .unwrap_or_default(),
                        ),
                        "cited_urls": ["https://orders.example.com/faq"],
                        "isRag": true
                    }
                }]
            }))
        }),
    );
    let use_case = remote(spawn_backend(backend).await);

    let result = use_case.execute(input()).await.unwrap();
    assert_eq!(result.id(), "conv_remote");
    assert_eq!(result.model(), "agent-support");
    assert_eq!(result.content(), "user-1 asked Where is my order? via req-remote-1");
    assert_eq!(result.cited_urls(), vec!["https://orders.example.com/faq"]);
    assert!(result.is_rag());
    assert_eq!(result.field("object"), Some(&json!("chat.completion")));
}

#[test(tokio::test)]
async fn non_success_status_is_an_upstream_error() {
    let backend = Router::new().route(
        "/chat",
        post(|| async { (StatusCode::BAD_GATEWAY, "retriever unavailable") }),
    );
    let use_case = remote(spawn_backend(backend).await);

    match use_case.execute(input()).await {
        Err(ChatUseCaseError::UpstreamStatus { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "retriever unavailable");
        }
        other => panic!("expected upstream status error, got {:?}", other),
    }
}

#[test(tokio::test)]
async fn unreadable_body_is_a_decode_error() {
    let backend = Router::new().route("/chat", post(|| async { "not json" }));
    let use_case = remote(spawn_backend(backend).await);

    assert!(matches!(
        use_case.execute(input()).await,
        Err(ChatUseCaseError::Decode(_))
    ));
}

#[test(tokio::test)]
async fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let use_case = remote(format!("http://{}/chat", addr));
    assert!(matches!(
        use_case.execute(input()).await,
        Err(ChatUseCaseError::Transport(_))
    ));
}
