use axum::http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};

/// Claims an upstream authorizer already validated and attached to the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerClaims {
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
}

impl AuthorizerClaims {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            user_id: Some(user_id.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub authorizer: Option<AuthorizerClaims>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            authorizer: None,
        }
    }
}

/// Platform-neutral inbound request. `HeaderMap` lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub path: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub context: RequestContext,
}

impl GatewayRequest {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        headers: HeaderMap,
        body: Option<String>,
        context: RequestContext,
    ) -> Self {
        Self {
            path: path.into(),
            method,
            headers,
            body,
            context,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.context.request_id
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|h| h.to_str().ok())
    }
}
