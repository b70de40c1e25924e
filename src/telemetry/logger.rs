//! The logger the gateway writes its request telemetry through.
//!
//! There is exactly one trait. The record helpers (`log_request`,
//! `log_response`, `log_error_with_context`) have default implementations, so a
//! minimal logger only provides the four level methods and silently skips the
//! structured records. [`StructuredLogger`] overrides them and forwards records
//! to a [`TelemetryRegistry`].

use super::{metrics::TelemetryRegistry, redact::sanitize_context, RequestTelemetryRecord};
use crate::error::error_chain;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub type ErrorRef<'a> = &'a (dyn std::error::Error + 'static);

pub trait GatewayLogger: Send + Sync {
    fn debug(&self, message: &str, context: &Value);
    fn info(&self, message: &str, context: &Value);
    fn warn(&self, message: &str, context: &Value);
    fn error(&self, message: &str, error: Option<ErrorRef<'_>>, context: &Value);

    fn log_request(&self, _record: &RequestTelemetryRecord) {}

    fn log_response(&self, _record: &RequestTelemetryRecord) {}

    fn log_error_with_context(
        &self,
        message: &str,
        error: ErrorRef<'_>,
        record: &RequestTelemetryRecord,
    ) {
        self.error(message, Some(error), &json!(record));
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl GatewayLogger for NoopLogger {
    fn debug(&self, _message: &str, _context: &Value) {}
    fn info(&self, _message: &str, _context: &Value) {}
    fn warn(&self, _message: &str, _context: &Value) {}
    fn error(&self, _message: &str, _error: Option<ErrorRef<'_>>, _context: &Value) {}
}

/// Emits sanitized JSON context on `tracing` events and records request
/// start/end to the telemetry registry.
#[derive(Clone, Default)]
pub struct StructuredLogger {
    registry: Option<Arc<TelemetryRegistry>>,
}

impl StructuredLogger {
    pub fn with_registry(registry: Arc<TelemetryRegistry>) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    fn record(&self, record: &RequestTelemetryRecord) {
        if let Some(registry) = &self.registry {
            registry.record(record);
        }
    }
}

/// Shape of the `error` field attached to error-level events.
pub fn describe_error(error: ErrorRef<'_>) -> Value {
    json!({
        "message": error.to_string(),
        "chain": error_chain(error),
        "debug": format!("{:?}", error),
    })
}

impl GatewayLogger for StructuredLogger {
    fn debug(&self, message: &str, context: &Value) {
        debug!(context = %sanitize_context(context), "{}", message);
    }

    fn info(&self, message: &str, context: &Value) {
        info!(context = %sanitize_context(context), "{}", message);
    }

    fn warn(&self, message: &str, context: &Value) {
        warn!(context = %sanitize_context(context), "{}", message);
    }

    fn error(&self, message: &str, err: Option<ErrorRef<'_>>, context: &Value) {
        let context = sanitize_context(context);
        match err {
            Some(err) => error!(context = %context, error = %describe_error(err), "{}", message),
            None => error!(context = %context, "{}", message),
        }
    }

    fn log_request(&self, record: &RequestTelemetryRecord) {
        self.info("Request received", &json!(record));
        self.record(record);
    }

    fn log_response(&self, record: &RequestTelemetryRecord) {
        self.info("Request completed", &json!(record));
        self.record(record);
    }

    fn log_error_with_context(
        &self,
        message: &str,
        err: ErrorRef<'_>,
        record: &RequestTelemetryRecord,
    ) {
        self.error(message, Some(err), &json!(record));
        self.record(record);
    }
}
