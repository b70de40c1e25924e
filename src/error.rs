use axum::http::StatusCode;

use crate::{usecase::ChatUseCaseError, validation::ValidationError};

/// Message returned to clients for every failure we did not expect.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Failures a single pass through the gateway can end in.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No credential source produced an authentication context")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Chat use case failed: {0}")]
    UseCase(#[from] ChatUseCaseError),

    #[error("Failed to frame chat response: {0}")]
    Framing(#[from] FramingError),
}

#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Failed to serialize response payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid response header value")]
    InvalidHeader,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::UseCase(_) | GatewayError::Framing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message a client is allowed to see. Downstream detail stays server-side.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
            GatewayError::Validation(e) => e.to_string(),
            GatewayError::UseCase(_) | GatewayError::Framing(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }
}

/// Renders an error together with its `source()` chain, outermost first.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut current = error.source();
    while let Some(source) = current {
        chain.push(source.to_string());
        current = source.source();
    }
    chain
}
