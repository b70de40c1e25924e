use crate::telemetry::{metrics::TelemetryExporter, RequestTelemetryRecord};
use metrics::{counter, histogram};

/// Publishes request counts and latencies through the `metrics` facade.
/// Whatever recorder the host installs decides where they end up.
pub struct PrometheusExporter {
    namespace: String,
}

impl PrometheusExporter {
    pub fn new(namespace: String) -> Self {
        Self { namespace }
    }
}

impl TelemetryExporter for PrometheusExporter {
    fn export_record(
        &self,
        record: &RequestTelemetryRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(status) = record.status_code else {
            let name = format!("{}_requests_received", self.namespace);
            counter!(name, "path" => record.path.clone(), "method" => record.method.clone())
                .increment(1);
            return Ok(());
        };

        let labels = [
            ("path", record.path.clone()),
            ("method", record.method.clone()),
            ("auth_method", record.auth_method.clone()),
            ("status", status.to_string()),
        ];

        let name = format!("{}_requests_completed", self.namespace);
        counter!(name, &labels[..]).increment(1);

        if let Some(ms) = record.duration_ms {
            let name = format!("{}_request_duration_seconds", self.namespace);
            histogram!(name, &labels[..]).record(ms as f64 / 1000.0);
        }

        if status >= 500 {
            let name = format!("{}_error_count", self.namespace);
            counter!(name, &labels[..]).increment(1);
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "prometheus"
    }
}
