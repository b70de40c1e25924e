use crate::telemetry::{metrics::TelemetryExporter, RequestTelemetryRecord};
use colored::Colorize;

/// Prints one line per record. Registered in debug mode only.
pub struct ConsoleExporter;

impl ConsoleExporter {
    pub fn new() -> Self {
        ConsoleExporter
    }

    pub fn render(record: &RequestTelemetryRecord) -> String {
        let who = format!(
            "tenant={} user={} auth={}",
            record.tenant_id.as_deref().unwrap_or("-"),
            record.user_id.as_deref().unwrap_or("-"),
            record.auth_method,
        );

        let outcome = match (record.status_code, record.duration_ms) {
            (Some(status), Some(ms)) => {
                let status = if status < 400 {
                    status.to_string().green()
                } else if status < 500 {
                    status.to_string().yellow()
                } else {
                    status.to_string().red()
                };
                format!("{} in {}ms", status, ms)
            }
            _ => "received".dimmed().to_string(),
        };

        format!(
            "{} {} {} [{}] {} {}",
            chrono::Utc::now().to_rfc3339(),
            record.method.bold(),
            record.path,
            record.request_id,
            who,
            outcome
        )
    }
}

impl Default for ConsoleExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryExporter for ConsoleExporter {
    fn export_record(
        &self,
        record: &RequestTelemetryRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("{}", Self::render(record));
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
