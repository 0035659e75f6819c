#![allow(dead_code)]

use actionkit_core::{
    ActionContext, ActionLogger, ActionMetric, ActionResult, MetricsRecorder, NotificationConfig,
    RemoteError, RemoteExecutor, Transport,
};
use actionkit_runtime::Notifier;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RemoteCall {
    pub operation_id: String,
    pub variables: JsonValue,
    pub token: Option<String>,
    pub had_transport: bool,
}

/// Remote executor answering every operation from a fixed table
pub struct FakeRemote {
    replies: Mutex<Vec<(String, Result<JsonValue, RemoteError>)>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(Vec::new()), calls: Mutex::new(Vec::new()) })
    }

    pub fn reply(self: &Arc<Self>, operation_id: &str, reply: Result<JsonValue, RemoteError>) -> Arc<Self> {
        self.replies.lock().unwrap().push((operation_id.to_string(), reply));
        self.clone()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation_id: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.operation_id == operation_id).count()
    }
}

#[async_trait]
impl RemoteExecutor for FakeRemote {
    async fn execute(
        &self,
        operation_id: &str,
        variables: &JsonValue,
        token: Option<&str>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<JsonValue, RemoteError> {
        self.calls.lock().unwrap().push(RemoteCall {
            operation_id: operation_id.to_string(),
            variables: variables.clone(),
            token: token.map(str::to_string),
            had_transport: transport.is_some(),
        });
        self.replies
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == operation_id)
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Err(RemoteError::QueryNotFound(operation_id.to_string())))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub level: &'static str,
    pub message: String,
    pub data: JsonValue,
}

#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingLogger {
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self, level: &str) -> Vec<String> {
        self.events().into_iter().filter(|e| e.level == level).map(|e| e.message).collect()
    }

    fn push(&self, level: &'static str, message: &str, data: &JsonValue) {
        self.events.lock().unwrap().push(LogEvent { level, message: message.to_string(), data: data.clone() });
    }
}

impl ActionLogger for RecordingLogger {
    fn info(&self, message: &str, data: &JsonValue) {
        self.push("info", message, data);
    }
    fn warn(&self, message: &str, data: &JsonValue) {
        self.push("warn", message, data);
    }
    fn error(&self, message: &str, data: &JsonValue) {
        self.push("error", message, data);
    }
    fn debug(&self, message: &str, data: &JsonValue) {
        self.push("debug", message, data);
    }
}

#[derive(Default)]
pub struct RecordingMetrics {
    records: Mutex<Vec<ActionMetric>>,
}

impl RecordingMetrics {
    pub fn records(&self) -> Vec<ActionMetric> {
        self.records.lock().unwrap().clone()
    }
}

impl MetricsRecorder for RecordingMetrics {
    fn record(&self, metric: ActionMetric) {
        self.records.lock().unwrap().push(metric);
    }
}

/// Sleeps, then fails; counts how often it finished
pub struct SlowFailingNotifier {
    pub delay: Duration,
    pub finished: AtomicUsize,
    pub seen: Mutex<Vec<ActionResult>>,
}

impl SlowFailingNotifier {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay, finished: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) })
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for SlowFailingNotifier {
    async fn notify(
        &self,
        _config: &NotificationConfig,
        _params: &JsonValue,
        result: &ActionResult,
        _context: &ActionContext,
    ) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(result.clone());
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("push gateway rejected the batch")
    }
}
