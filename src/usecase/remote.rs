use super::{ChatInput, ChatResult, ChatUseCase, ChatUseCaseError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::{debug, error};

/// Shared HTTP client with connection pooling. No request timeout: how long a
/// chat turn may take is decided by the hosting runtime, not here.
pub static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(32)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .expect("Failed to create HTTP client")
});

/// Dispatches chat turns to the RAG backend over HTTP.
pub struct RemoteChatUseCase {
    endpoint: String,
    client: reqwest::Client,
}

impl RemoteChatUseCase {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: CLIENT.clone(),
        }
    }

    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatUseCase for RemoteChatUseCase {
    async fn execute(&self, input: ChatInput) -> Result<ChatResult, ChatUseCaseError> {
        debug!(
            endpoint = %self.endpoint,
            request_id = %input.request_id,
            agent_id = %input.agent_id,
            "Dispatching chat turn to backend"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-request-id", &input.request_id)
            .json(&input)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            error!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "Chat backend returned non-success status"
            );
            return Err(ChatUseCaseError::UpstreamStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}
