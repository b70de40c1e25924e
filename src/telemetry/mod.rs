pub mod exporters;
pub mod logger;
pub mod metrics;
pub mod plugins;
pub mod redact;

pub use self::{
    exporters::prometheus::PrometheusExporter,
    logger::{GatewayLogger, NoopLogger, StructuredLogger},
    metrics::{TelemetryExporter, TelemetryRegistry},
    plugins::ConsoleExporter,
    redact::sanitize_context,
};

use serde::{Deserialize, Serialize};

/// Written once when a request is accepted and once when it is answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTelemetryRecord {
    pub request_id: String,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub path: String,
    pub method: String,
    pub auth_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl RequestTelemetryRecord {
    pub fn new(
        request_id: impl Into<String>,
        path: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            tenant_id: None,
            user_id: None,
            path: path.into(),
            method: method.into(),
            auth_method: "none".to_string(),
            status_code: None,
            duration_ms: None,
        }
    }

    pub fn with_identity(
        mut self,
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        auth_method: impl Into<String>,
    ) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self.user_id = Some(user_id.into());
        self.auth_method = auth_method.into();
        self
    }

    pub fn completed(mut self, status_code: u16, duration_ms: u64) -> Self {
        self.status_code = Some(status_code);
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Start records have no status yet.
    pub fn is_completion(&self) -> bool {
        self.status_code.is_some()
    }
}
