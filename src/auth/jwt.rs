//! HS256 bearer token verification.
//!
//! Every way a token can be unusable is a [`JwtRejection`], which the resolver
//! treats as "try the next credential source" rather than as a failure.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Claims the gateway reads from a token. Anything else in the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(
        rename = "custom:tenant_id",
        alias = "tenant_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tenant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Identity carried by a token that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: String,
    pub tenant_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtRejection {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("Token is empty")]
    EmptyToken,

    #[error("Token verification failed: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Token is missing the subject claim")]
    MissingSubject,

    #[error("Token is missing the tenant claim")]
    MissingTenant,
}

/// Verifies tokens signed with one shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    secret: Option<SecretString>,
    algorithm: Algorithm,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(secret: Option<SecretString>) -> Self {
        let secret = secret.filter(|s| !s.expose_secret().is_empty());
        Self {
            secret,
            algorithm: Algorithm::HS256,
        }
    }

    pub fn from_secret(secret: &str) -> Self {
        Self::new(Some(SecretString::from(secret.to_string())))
    }

    /// A verifier that rejects every token.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, JwtRejection> {
        let secret = self.secret.as_ref().ok_or(JwtRejection::MissingSecret)?;

        let token = token.trim();
        if token.is_empty() {
            return Err(JwtRejection::EmptyToken);
        }

        let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

        // exp and nbf are checked when present but not demanded.
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims = HashSet::new();
        validation.validate_nbf = true;
        validation.validate_aud = false;

        let claims = decode::<Claims>(token, &key, &validation)?.claims;

        let user_id = claims
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(JwtRejection::MissingSubject)?;
        let tenant_id = claims
            .tenant_id
            .filter(|s| !s.is_empty())
            .ok_or(JwtRejection::MissingTenant)?;

        Ok(VerifiedToken { user_id, tenant_id })
    }
}

/// Strips an optional `Bearer ` prefix from an `Authorization` header value.
pub fn strip_bearer(header_value: &str) -> &str {
    header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value)
}
