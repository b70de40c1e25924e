use super::RequestTelemetryRecord;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info};

pub trait TelemetryExporter: Send + Sync {
    fn export_record(
        &self,
        record: &RequestTelemetryRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn name(&self) -> &str;
}

/// Fans request telemetry records out to every registered exporter.
///
/// Exporter failures are logged and dropped so that telemetry can never
/// change the outcome of the request being recorded.
pub struct TelemetryRegistry {
    exporters: Arc<RwLock<Vec<Box<dyn TelemetryExporter>>>>,
    debug_mode: bool,
}

impl TelemetryRegistry {
    pub fn new(debug_mode: bool) -> Self {
        Self {
            exporters: Arc::new(RwLock::new(Vec::new())),
            debug_mode,
        }
    }

    pub fn register_exporter(&self, exporter: Box<dyn TelemetryExporter>) {
        let mut exporters = self.exporters.write();
        info!("Registering telemetry exporter: {}", exporter.name());
        exporters.push(exporter);
    }

    pub fn exporter_count(&self) -> usize {
        self.exporters.read().len()
    }

    pub fn record(&self, record: &RequestTelemetryRecord) {
        if self.debug_mode {
            debug!("Request telemetry: {:?}", record);
        }

        let exporters = self.exporters.read();
        for exporter in exporters.iter() {
            if let Err(e) = exporter.export_record(record) {
                error!("Failed to export telemetry to {}: {}", exporter.name(), e);
            }
        }
    }
}
