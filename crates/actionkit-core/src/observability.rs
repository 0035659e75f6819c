//! Logger and metrics collaborators.
//!
//! The service never talks to `tracing` or a metrics backend directly; it goes
//! through these traits so hosts can route events wherever they want. The
//! defaults forward to `tracing` and drop metrics respectively.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Structured log sink
pub trait ActionLogger: Send + Sync {
    fn info(&self, message: &str, data: &JsonValue);
    fn warn(&self, message: &str, data: &JsonValue);
    fn error(&self, message: &str, data: &JsonValue);
    fn debug(&self, message: &str, data: &JsonValue);
}

/// Forwards every event to `tracing` under the `actionkit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ActionLogger for TracingLogger {
    fn info(&self, message: &str, data: &JsonValue) {
        tracing::info!(target: "actionkit", data = %data, "{}", message);
    }

    fn warn(&self, message: &str, data: &JsonValue) {
        tracing::warn!(target: "actionkit", data = %data, "{}", message);
    }

    fn error(&self, message: &str, data: &JsonValue) {
        tracing::error!(target: "actionkit", data = %data, "{}", message);
    }

    fn debug(&self, message: &str, data: &JsonValue) {
        tracing::debug!(target: "actionkit", data = %data, "{}", message);
    }
}

/// One record per `execute_action` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMetric {
    pub system: String,
    pub action_key: String,
    pub user_id: String,
    pub success: bool,
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fire-and-forget metrics sink
pub trait MetricsRecorder: Send + Sync {
    fn record(&self, metric: ActionMetric);
}

/// Drops every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    #[inline(always)]
    fn record(&self, _metric: ActionMetric) {}
}

/// Emits each record as a `debug` event, handy when no metrics backend is wired
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsRecorder for TracingMetrics {
    fn record(&self, metric: ActionMetric) {
        tracing::debug!(
            target: "actionkit::metrics",
            system = %metric.system,
            action_key = %metric.action_key,
            user_id = %metric.user_id,
            success = metric.success,
            response_time_ms = metric.response_time_ms,
            error = metric.error.as_deref().unwrap_or(""),
            "action metric"
        );
    }
}
