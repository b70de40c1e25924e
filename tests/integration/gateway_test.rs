use super::common::*;
use axum::http::StatusCode;
use rag_chat_gateway::usecase::{ChatResult, Role};
use serde_json::json;
use test_log::test;

fn answer() -> ChatResult {
    ChatResult::new("conv_42", "agent-support", "Refunds are processed within 5 days.")
        .with_citations(vec!["https://docs.example.com/refunds".into()], true)
}

#[test(tokio::test)]
async fn missing_credentials_get_401_and_an_info_log() {
    let h = harness(MockUseCase::returning(answer()));
    let response = h
        .gateway
        .handle(RequestBuilder::new().body(chat_body("hi", None)).build())
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&response.body_bytes()), json!({ "error": "Unauthorized" }));
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    assert_eq!(h.use_case.call_count(), 0);

    let entry = h.logger.find("Unauthorized access attempt").unwrap();
    assert_eq!(entry.level, Level::Info);
    assert_eq!(entry.context["path"], CHAT_PATH);
    assert_eq!(entry.context["requestId"], "req-int-1");
    assert_eq!(entry.context["reason"], "Missing authentication credentials");
    assert!(h.logger.at(Level::Error).is_empty());
}

#[test(tokio::test)]
async fn unauthenticated_malformed_body_is_still_401() {
    let h = harness(MockUseCase::returning(answer()));
    let response = h
        .gateway
        .handle(RequestBuilder::new().body("{not json").build())
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(h.logger.find("Validation error").is_none());
}

#[test(tokio::test)]
async fn validation_failures_are_400_at_info_level() {
    let cases = [
        ("{\"model\": ", "Request body must be valid JSON"),
        (
            r#"{"model":"a","messages":[{"role":"user","content":"x"}],"stream":"true"}"#,
            "stream must be a boolean",
        ),
    ];
    for (body, expected) in cases {
        let h = harness(MockUseCase::returning(answer()));
        let response = h
            .gateway
            .handle(RequestBuilder::new().api_key().body(body).build())
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&response.body_bytes()), json!({ "error": expected }));
        assert_eq!(h.use_case.call_count(), 0);

        let entry = h.logger.find("Validation error").unwrap();
        assert_eq!(entry.level, Level::Info);
        assert_eq!(entry.context["error"], expected);
        assert!(entry.context["durationMs"].is_u64());
        assert!(h.logger.at(Level::Error).is_empty());
    }
}

#[test(tokio::test)]
async fn schema_violation_reports_a_message() {
    let h = harness(MockUseCase::returning(answer()));
    let response = h
        .gateway
        .handle(
            RequestBuilder::new()
                .api_key()
                .body(r#"{"model":"agent-support","messages":[]}"#)
                .build(),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = json_body(&response.body_bytes());
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[test(tokio::test)]
async fn empty_body_is_a_schema_error_not_a_json_error() {
    let h = harness(MockUseCase::returning(answer()));
    let response = h
        .gateway
        .handle(RequestBuilder::new().api_key().build())
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_ne!(
        json_body(&response.body_bytes())["error"],
        "Request body must be valid JSON"
    );
}

#[test(tokio::test)]
async fn non_streaming_request_returns_the_result_unchanged() {
    let h = harness(MockUseCase::returning(answer()));
    let response = h
        .gateway
        .handle(
            RequestBuilder::new()
                .api_key()
                .body(chat_body("How do refunds work?", Some(false)))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("application/json"));
    let body: ChatResult = serde_json::from_slice(&response.body_bytes()).unwrap();
    assert_eq!(body, answer());

    let calls = h.use_case.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tenant_id, API_KEY_TENANT);
    assert_eq!(calls[0].user_id, API_KEY_USER);
    assert_eq!(calls[0].agent_id, "agent-support");
    assert_eq!(calls[0].request_id, "req-int-1");
    assert_eq!(calls[0].messages[0].role, Role::User);
    assert_eq!(calls[0].messages[0].content, "How do refunds work?");
}

#[test(tokio::test)]
async fn non_streaming_body_keeps_backend_nulls() {
    let raw = json!({
        "id": "conv_null",
        "model": "agent-support",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": null, "cited_urls": null, "isRag": null }
        }]
    });
    let result: ChatResult = serde_json::from_value(raw.clone()).unwrap();
    let h = harness(MockUseCase::returning(result));
    let response = h
        .gateway
        .handle(RequestBuilder::new().api_key().body(chat_body("hi", None)).build())
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(json_body(&response.body_bytes()), raw);
}

#[test(tokio::test)]
async fn successful_request_is_logged_start_and_end() {
    let h = harness(MockUseCase::returning(answer()));
    h.gateway
        .handle(RequestBuilder::new().api_key().body(chat_body("hi", None)).build())
        .await;

    let requests = h.logger.requests.lock();
    let responses = h.logger.responses.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(responses.len(), 1);
    assert_eq!(requests[0].tenant_id.as_deref(), Some(API_KEY_TENANT));
    assert_eq!(requests[0].auth_method, "apikey");
    assert_eq!(responses[0].status_code, Some(200));
    assert!(responses[0].duration_ms.is_some());

    let received = h.logger.find("Chat request received").unwrap();
    assert_eq!(received.context["agentId"], "agent-support");
    assert_eq!(received.context["messageCount"], 1);
    assert_eq!(received.context["streaming"], false);
    assert_eq!(received.context["authMethod"], "apikey");

    let generated = h.logger.find("Chat response generated").unwrap();
    assert_eq!(generated.context["conversationId"], "conv_42");
    assert_eq!(generated.context["citedUrlCount"], 1);
}

#[test(tokio::test)]
async fn use_case_failure_is_a_generic_500() {
    let h = harness(MockUseCase::failing(
        "connection refused: vector-db.internal:6333",
    ));
    let response = h
        .gateway
        .handle(RequestBuilder::new().api_key().body(chat_body("hi", None)).build())
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.body_bytes();
    assert_eq!(json_body(&body), json!({ "error": "Internal server error" }));
    assert!(!String::from_utf8_lossy(&body).contains("vector-db"));
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));

    let errors = h.logger.at(Level::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Error in chat gateway");
    assert!(errors[0].error.as_deref().unwrap().contains("vector-db"));
    assert_eq!(errors[0].context["tenantId"], API_KEY_TENANT);
    assert_eq!(errors[0].context["userId"], API_KEY_USER);
    assert_eq!(errors[0].context["path"], CHAT_PATH);
    assert_eq!(errors[0].context["method"], "POST");
    assert_eq!(errors[0].context["authMethod"], "apikey");
    assert_eq!(errors[0].context["requestId"], "req-int-1");
    assert_eq!(errors[0].context["statusCode"], 500);
    assert!(h.logger.responses.lock().is_empty());
}

#[test(tokio::test)]
async fn authorizer_claims_take_precedence() {
    let h = harness(MockUseCase::returning(answer()));
    h.gateway
        .handle(
            RequestBuilder::new()
                .authorizer("tenant-authz", "user-authz")
                .bearer(&user_jwt("tenant-jwt", "user-jwt"))
                .api_key()
                .body(chat_body("hi", None))
                .build(),
        )
        .await;

    let calls = h.use_case.calls.lock();
    assert_eq!(calls[0].tenant_id, "tenant-authz");
    assert_eq!(calls[0].user_id, "user-authz");
    assert_eq!(h.logger.requests.lock()[0].auth_method, "apikey");
}

#[test(tokio::test)]
async fn jwt_takes_precedence_over_api_key() {
    let h = harness(MockUseCase::returning(answer()));
    h.gateway
        .handle(
            RequestBuilder::new()
                .bearer(&user_jwt("tenant-jwt", "user-jwt"))
                .api_key()
                .body(chat_body("hi", None))
                .build(),
        )
        .await;

    let calls = h.use_case.calls.lock();
    assert_eq!(calls[0].tenant_id, "tenant-jwt");
    assert_eq!(calls[0].user_id, "user-jwt");
    assert_eq!(h.logger.requests.lock()[0].auth_method, "jwt");
}

#[test(tokio::test)]
async fn jwt_without_tenant_falls_through_to_api_key() {
    let h = harness(MockUseCase::returning(answer()));
    let token = mint_jwt(json!({ "sub": "user-jwt" }));
    let response = h
        .gateway
        .handle(
            RequestBuilder::new()
                .bearer(&token)
                .api_key()
                .body(chat_body("hi", None))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(h.use_case.calls.lock()[0].tenant_id, API_KEY_TENANT);

    let warning = h.logger.find("JWT verification failed").unwrap();
    assert_eq!(warning.level, Level::Warn);
    let rendered = warning.context.to_string();
    assert!(!rendered.contains(&token));
    assert!(!rendered.contains(JWT_SECRET));
}

#[test(tokio::test)]
async fn request_id_is_forwarded_to_logs_and_use_case() {
    let h = harness(MockUseCase::returning(answer()));
    h.gateway
        .handle(RequestBuilder::new().api_key().body(chat_body("hi", None)).build())
        .await;
    assert!(h
        .logger
        .entries
        .lock()
        .iter()
        .filter(|e| e.level == Level::Info)
        .all(|e| e.context["requestId"] == "req-int-1"));
}
