//! Per-request orchestration: authenticate, validate, dispatch, frame.
//!
//! A request moves through `received → authenticating → validating →
//! dispatching → framing → responded`. Client faults (no credentials, a bad
//! body) end early with 401/400 and are logged at info. Anything failing after
//! that is a 500 with a generic body; the detail is only logged.

use crate::{
    auth::{AuthenticationContext, CredentialResolver},
    context::GatewayRequest,
    error::GatewayError,
    response::GatewayResponse,
    telemetry::{GatewayLogger, RequestTelemetryRecord},
    usecase::{ChatInput, ChatUseCase},
    validation::{validate_chat_request, ChatRequest},
};
use serde_json::json;
use std::{sync::Arc, time::Instant};

pub const UNAUTHORIZED_LOG_MESSAGE: &str = "Unauthorized access attempt";
pub const MISSING_CREDENTIALS_REASON: &str = "Missing authentication credentials";
pub const VALIDATION_LOG_MESSAGE: &str = "Validation error";
pub const FAILURE_LOG_MESSAGE: &str = "Error in chat gateway";

pub struct ChatGateway {
    resolver: CredentialResolver,
    use_case: Arc<dyn ChatUseCase>,
    logger: Arc<dyn GatewayLogger>,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl ChatGateway {
    pub fn new(
        resolver: CredentialResolver,
        use_case: Arc<dyn ChatUseCase>,
        logger: Arc<dyn GatewayLogger>,
    ) -> Self {
        Self {
            resolver,
            use_case,
            logger,
        }
    }

    /// Handles one request to completion. Never fails: every outcome is a response.
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        let start = Instant::now();

        let Some(auth) = self.resolver.resolve(&request).await else {
            self.logger.info(
                UNAUTHORIZED_LOG_MESSAGE,
                &json!({
                    "requestId": request.request_id(),
                    "path": request.path,
                    "reason": MISSING_CREDENTIALS_REASON,
                }),
            );
            return error_response(&GatewayError::Unauthorized);
        };

        let chat_request = match validate_chat_request(request.body.as_deref()) {
            Ok(chat_request) => chat_request,
            Err(validation) => {
                self.logger.info(
                    VALIDATION_LOG_MESSAGE,
                    &json!({
                        "requestId": request.request_id(),
                        "error": validation.message(),
                        "durationMs": elapsed_ms(start),
                    }),
                );
                return error_response(&GatewayError::Validation(validation));
            }
        };

        let record = RequestTelemetryRecord::new(
            request.request_id(),
            request.path.as_str(),
            request.method.as_str(),
        )
        .with_identity(auth.tenant_id(), auth.user_id(), auth.auth_method().as_str());

        match self.dispatch(&request, &auth, chat_request, &record, start).await {
            Ok(response) => response,
            Err(failure) => {
                let record = record.completed(failure.status().as_u16(), elapsed_ms(start));
                self.logger
                    .log_error_with_context(FAILURE_LOG_MESSAGE, &failure, &record);
                error_response(&failure)
            }
        }
    }

    async fn dispatch(
        &self,
        request: &GatewayRequest,
        auth: &AuthenticationContext,
        chat_request: ChatRequest,
        record: &RequestTelemetryRecord,
        start: Instant,
    ) -> Result<GatewayResponse, GatewayError> {
        let stream_requested = chat_request.stream_requested;

        self.logger.log_request(record);
        self.logger.info(
            "Chat request received",
            &json!({
                "requestId": request.request_id(),
                "tenantId": auth.tenant_id(),
                "userId": auth.user_id(),
                "path": request.path,
                "method": request.method.as_str(),
                "agentId": chat_request.agent_id,
                "messageCount": chat_request.messages.len(),
                "streaming": stream_requested,
                "authMethod": auth.auth_method(),
            }),
        );

        let result = self
            .use_case
            .execute(ChatInput {
                tenant_id: auth.tenant_id().to_string(),
                user_id: auth.user_id().to_string(),
                agent_id: chat_request.agent_id,
                messages: chat_request.messages,
                request_id: request.request_id().to_string(),
            })
            .await?;

        let duration_ms = elapsed_ms(start);
        self.logger
            .log_response(&record.clone().completed(200, duration_ms));
        self.logger.info(
            if stream_requested {
                "Streaming chat response generated"
            } else {
                "Chat response generated"
            },
            &json!({
                "requestId": request.request_id(),
                "conversationId": result.id(),
                "citedUrlCount": result.cited_urls().len(),
                "durationMs": duration_ms,
            }),
        );

        Ok(GatewayResponse::frame(&result, stream_requested)?)
    }
}

fn error_response(error: &GatewayError) -> GatewayResponse {
    GatewayResponse::error(error.status(), &error.client_message())
}
