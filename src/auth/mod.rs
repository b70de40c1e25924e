//! Credential resolution.
//!
//! Three sources are tried in order and the first that yields an identity
//! wins; sources are never combined:
//! 1. claims attached by an upstream authorizer
//! 2. an HS256 bearer token in the `Authorization` header
//! 3. an API key checked against the trusted key store
//!
//! Finding no identity is a normal outcome (`None`), not an error.

pub mod api_key;
pub mod jwt;

pub use api_key::{ApiKeyStore, ApiKeyValidation, StaticApiKeyStore};
pub use jwt::{JwtRejection, JwtVerifier};

use crate::{context::GatewayRequest, telemetry::GatewayLogger};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{fmt, sync::Arc};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const JWT_REJECTED_LOG_MESSAGE: &str = "JWT verification failed";
pub const JWT_SKIPPED_LOG_MESSAGE: &str = "JWT verification skipped";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    ApiKey,
    Jwt,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::ApiKey => "apikey",
            AuthMethod::Jwt => "jwt",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is calling. Resolved at most once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationContext {
    tenant_id: String,
    user_id: String,
    auth_method: AuthMethod,
}

impl AuthenticationContext {
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        auth_method: AuthMethod,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            auth_method,
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub struct CredentialResolver {
    jwt: JwtVerifier,
    api_keys: Arc<dyn ApiKeyStore>,
    logger: Arc<dyn GatewayLogger>,
}

impl CredentialResolver {
    pub fn new(
        jwt: JwtVerifier,
        api_keys: Arc<dyn ApiKeyStore>,
        logger: Arc<dyn GatewayLogger>,
    ) -> Self {
        Self {
            jwt,
            api_keys,
            logger,
        }
    }

    pub async fn resolve(&self, request: &GatewayRequest) -> Option<AuthenticationContext> {
        match self
            .from_authorizer(request)
            .or_else(|| self.from_bearer_token(request))
        {
            Some(context) => Some(context),
            None => self.from_api_key(request).await,
        }
    }

    fn from_authorizer(&self, request: &GatewayRequest) -> Option<AuthenticationContext> {
        let claims = request.context.authorizer.as_ref()?;
        let tenant_id = non_empty(claims.tenant_id.as_deref())?;
        let user_id = non_empty(claims.user_id.as_deref())?;
        Some(AuthenticationContext::new(
            tenant_id,
            user_id,
            AuthMethod::ApiKey,
        ))
    }

    fn from_bearer_token(&self, request: &GatewayRequest) -> Option<AuthenticationContext> {
        let header = request.header(http::header::AUTHORIZATION.as_str())?;
        let token = jwt::strip_bearer(header);

        match self.jwt.verify(token) {
            Ok(verified) => Some(AuthenticationContext::new(
                verified.tenant_id,
                verified.user_id,
                AuthMethod::Jwt,
            )),
            Err(rejection) => {
                let context = json!({
                    "requestId": request.request_id(),
                    "path": request.path,
                    "reason": rejection.to_string(),
                });
                // Without a secret every bearer value is expected to fall through.
                if matches!(rejection, JwtRejection::MissingSecret) {
                    self.logger.debug(JWT_SKIPPED_LOG_MESSAGE, &context);
                } else {
                    self.logger.warn(JWT_REJECTED_LOG_MESSAGE, &context);
                }
                None
            }
        }
    }

    async fn from_api_key(&self, request: &GatewayRequest) -> Option<AuthenticationContext> {
        let api_key = non_empty(request.header(API_KEY_HEADER)).or_else(|| {
            request
                .header(http::header::AUTHORIZATION.as_str())
                .map(jwt::strip_bearer)
                .filter(|token| !token.is_empty())
        })?;

        let validation = self.api_keys.validate(api_key).await;
        if !validation.is_valid {
            self.logger.debug(
                "API key rejected",
                &json!({ "requestId": request.request_id() }),
            );
            return None;
        }

        let tenant_id = non_empty(validation.tenant_id.as_deref())?;
        let user_id = non_empty(validation.user_id.as_deref())?;
        Some(AuthenticationContext::new(
            tenant_id,
            user_id,
            AuthMethod::ApiKey,
        ))
    }
}
