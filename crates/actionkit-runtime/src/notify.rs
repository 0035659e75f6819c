//! Detached notification delivery

use actionkit_core::{panic_message, ActionContext, ActionLogger, ActionResult, NotificationConfig};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{json, Value as JsonValue};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Fan-out engine contract. Rendering, recipient resolution and delivery
/// happen behind this call.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        config: &NotificationConfig,
        params: &JsonValue,
        result: &ActionResult,
        context: &ActionContext,
    ) -> anyhow::Result<()>;
}

/// Everything a detached delivery needs, owned by the task
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub action_key: String,
    pub config: NotificationConfig,
    pub params: JsonValue,
    pub result: ActionResult,
    pub context: ActionContext,
}

/// Owns detached notification tasks.
///
/// Every task gets a terminal handler that logs failures and panics, so a
/// delivery problem can never reach the caller or change its result.
#[derive(Clone)]
pub struct NotificationSupervisor {
    inner: Arc<SupervisorState>,
}

struct SupervisorState {
    in_flight: AtomicUsize,
    idle: Notify,
    logger: Arc<dyn ActionLogger>,
}

impl NotificationSupervisor {
    pub fn new(logger: Arc<dyn ActionLogger>) -> Self {
        Self {
            inner: Arc::new(SupervisorState {
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                logger,
            }),
        }
    }

    /// Tasks spawned and not yet finished
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Spawn delivery of `job` and return immediately
    pub fn dispatch(&self, notifier: Arc<dyn Notifier>, job: NotificationJob) -> JoinHandle<()> {
        let state = self.inner.clone();
        state.in_flight.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let delivery = notifier.notify(&job.config, &job.params, &job.result, &job.context);
            let outcome = AssertUnwindSafe(delivery).catch_unwind().await;

            let fields = json!({
                "actionKey": job.action_key,
                "userId": job.context.user_id(),
                "requestId": job.context.request_id(),
            });
            match outcome {
                Ok(Ok(())) => state.logger.debug("Notification delivered", &fields),
                Ok(Err(e)) => state.logger.error(
                    "Notification delivery failed",
                    &with_field(fields, "error", json!(format!("{:#}", e))),
                ),
                Err(panic) => state.logger.error(
                    "Notification task panicked",
                    &with_field(fields, "error", json!(panic_message(panic.as_ref()))),
                ),
            }

            if state.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                state.idle.notify_waiters();
            }
        })
    }

    /// Resolve once no notification task is running
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            idle.await;
        }
    }
}

impl std::fmt::Debug for NotificationSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSupervisor").field("in_flight", &self.in_flight()).finish()
    }
}

fn with_field(mut fields: JsonValue, key: &str, value: JsonValue) -> JsonValue {
    if let Some(map) = fields.as_object_mut() {
        map.insert(key.to_string(), value);
    }
    fields
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<(String, String)>>,
    }

    impl RecordingLogger {
        fn errors(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|(level, _)| level == "error")
                .map(|(_, message)| message.clone())
                .collect()
        }

        fn push(&self, level: &str, message: &str) {
            self.events.lock().unwrap().push((level.to_string(), message.to_string()));
        }
    }

    impl ActionLogger for RecordingLogger {
        fn info(&self, message: &str, _data: &JsonValue) {
            self.push("info", message);
        }
        fn warn(&self, message: &str, _data: &JsonValue) {
            self.push("warn", message);
        }
        fn error(&self, message: &str, _data: &JsonValue) {
            self.push("error", message);
        }
        fn debug(&self, message: &str, _data: &JsonValue) {
            self.push("debug", message);
        }
    }

    enum Behavior {
        Succeed,
        Fail,
        Panic,
    }

    struct TestNotifier {
        behavior: Behavior,
        delay: Duration,
    }

    #[async_trait]
    impl Notifier for TestNotifier {
        async fn notify(
            &self,
            _config: &NotificationConfig,
            _params: &JsonValue,
            _result: &ActionResult,
            _context: &ActionContext,
        ) -> anyhow::Result<()> {
            tokio::time::sleep(self.delay).await;
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(anyhow::anyhow!("smtp relay unavailable")),
                Behavior::Panic => panic!("template engine exploded"),
            }
        }
    }

    fn job() -> NotificationJob {
        NotificationJob {
            action_key: "createProject".into(),
            config: NotificationConfig::default(),
            params: json!({}),
            result: ActionResult::ok(json!({"id": 1}), None),
            context: ActionContext::new("u1", "jwt", "en"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_does_not_wait_for_delivery() {
        let logger = Arc::new(RecordingLogger::default());
        let supervisor = NotificationSupervisor::new(logger.clone());
        let notifier = Arc::new(TestNotifier { behavior: Behavior::Succeed, delay: Duration::from_secs(30) });

        let started = tokio::time::Instant::now();
        supervisor.dispatch(notifier, job());
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(supervisor.in_flight(), 1);

        supervisor.wait_idle().await;
        assert_eq!(supervisor.in_flight(), 0);
        assert!(logger.errors().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_logged_not_propagated() {
        let logger = Arc::new(RecordingLogger::default());
        let supervisor = NotificationSupervisor::new(logger.clone());
        let notifier = Arc::new(TestNotifier { behavior: Behavior::Fail, delay: Duration::ZERO });

        supervisor.dispatch(notifier, job()).await.unwrap();

        assert_eq!(logger.errors(), vec!["Notification delivery failed".to_string()]);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let logger = Arc::new(RecordingLogger::default());
        let supervisor = NotificationSupervisor::new(logger.clone());
        let notifier = Arc::new(TestNotifier { behavior: Behavior::Panic, delay: Duration::ZERO });

        let handle = supervisor.dispatch(notifier, job());
        assert!(handle.await.is_ok(), "the task itself must not panic");

        assert_eq!(logger.errors(), vec!["Notification task panicked".to_string()]);
        assert_eq!(supervisor.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_without_tasks_returns() {
        let supervisor = NotificationSupervisor::new(Arc::new(RecordingLogger::default()));
        supervisor.wait_idle().await;
    }
}
