use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension,
};
use std::{any::Any, sync::Arc};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    context::{AuthorizerClaims, GatewayRequest, RequestContext},
    error::INTERNAL_ERROR_MESSAGE,
    gateway::ChatGateway,
    response::GatewayResponse,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const AUTHORIZER_TENANT_HEADER: &str = "x-authorizer-tenant-id";
pub const AUTHORIZER_USER_HEADER: &str = "x-authorizer-user-id";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ChatGateway>,
    /// Read authorizer claims from headers. Only safe behind a proxy that strips them.
    pub trust_authorizer_headers: bool,
}

impl AppState {
    pub fn new(gateway: Arc<ChatGateway>) -> Self {
        Self {
            gateway,
            trust_authorizer_headers: false,
        }
    }

    pub fn trusting_authorizer_headers(mut self, trust: bool) -> Self {
        self.trust_authorizer_headers = trust;
        self
    }
}

pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn chat_completions(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    authorizer: Option<Extension<AuthorizerClaims>>,
    body: Bytes,
) -> Response {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let authorizer = authorizer
        .map(|Extension(claims)| claims)
        .or_else(|| {
            state
                .trust_authorizer_headers
                .then(|| authorizer_from_headers(&headers))
                .flatten()
        });

    let mut context = RequestContext::new(request_id.clone());
    context.authorizer = authorizer;

    let body = (!body.is_empty()).then(|| String::from_utf8_lossy(&body).into_owned());

    debug!(request_id = %request_id, path = %uri.path(), "Handling chat completion request");

    let request = GatewayRequest::new(method, uri.path(), headers, body, context);
    let mut response = state.gateway.handle(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response.into_response()
}

fn authorizer_from_headers(headers: &HeaderMap) -> Option<AuthorizerClaims> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    };
    let claims = AuthorizerClaims {
        tenant_id: read(AUTHORIZER_TENANT_HEADER),
        user_id: read(AUTHORIZER_USER_HEADER),
    };
    (claims.tenant_id.is_some() || claims.user_id.is_some()).then_some(claims)
}

/// Answers a panicked request with the generic 500 body.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "Request handler panicked");

    GatewayResponse::error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        .into_response()
}
