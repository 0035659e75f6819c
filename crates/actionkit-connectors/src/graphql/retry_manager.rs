//! Retry decisions and exponential backoff for remote operations

use actionkit_core::RemoteError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-client retry budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Classification of errors for retry decision making
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// No response or a 5xx response
    Retryable,
    /// Client errors, backend error lists, catalog misses
    NonRetryable,
}

/// Result of retry decision making
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Retry the operation after the specified delay
    Retry { delay: Duration, attempt_number: u32 },
    /// Stop retrying and return the error
    Stop { reason: String, final_attempt: u32 },
}

#[derive(Debug, Clone)]
pub struct RetryManager {
    policy: RetryPolicy,
    /// Whether to add jitter to delay calculations
    use_jitter: bool,
}

impl RetryManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, use_jitter: false }
    }

    /// Enable or disable full jitter in delay calculations
    pub fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classify_error(&self, error: &RemoteError) -> ErrorClassification {
        if error.is_retryable() {
            ErrorClassification::Retryable
        } else {
            ErrorClassification::NonRetryable
        }
    }

    /// Decide what to do after a failed attempt; `retries_done` counts the
    /// retries already performed (0 after the first attempt fails)
    pub fn should_retry(&self, error: &RemoteError, retries_done: u32) -> RetryDecision {
        if self.classify_error(error) == ErrorClassification::NonRetryable {
            return RetryDecision::Stop {
                reason: "Error is not retryable".to_string(),
                final_attempt: retries_done + 1,
            };
        }

        if retries_done >= self.policy.max_retries {
            return RetryDecision::Stop {
                reason: format!("Maximum retry attempts ({}) exceeded", self.policy.max_retries),
                final_attempt: retries_done + 1,
            };
        }

        RetryDecision::Retry {
            delay: self.calculate_delay(retries_done),
            attempt_number: retries_done + 2,
        }
    }

    /// Delay before retry number `retry_index` (0-based)
    pub fn calculate_delay(&self, retry_index: u32) -> Duration {
        let base_delay = self.policy.initial_delay_ms as f64
            * self.policy.backoff_multiplier.powi(retry_index.min(i32::MAX as u32) as i32);

        let capped_delay = base_delay.min(self.policy.max_delay_ms as f64);

        let final_delay = if self.use_jitter { self.add_jitter(capped_delay) } else { capped_delay };

        Duration::from_millis(final_delay as u64)
    }

    /// Full jitter: uniform between 0 and the capped delay
    fn add_jitter(&self, delay_ms: f64) -> f64 {
        let mut rng = rand::thread_rng();
        rng.gen::<f64>() * delay_ms
    }
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(max_retries: u32) -> RetryManager {
        RetryManager::new(RetryPolicy { max_retries, ..RetryPolicy::default() })
    }

    #[test]
    fn test_error_classification() {
        let manager = RetryManager::default();

        assert_eq!(
            manager.classify_error(&RemoteError::Network("connection reset".into())),
            ErrorClassification::Retryable
        );
        assert_eq!(
            manager.classify_error(&RemoteError::Http { status: 502, body: String::new() }),
            ErrorClassification::Retryable
        );
        assert_eq!(
            manager.classify_error(&RemoteError::Http { status: 429, body: String::new() }),
            ErrorClassification::NonRetryable
        );
        assert_eq!(
            manager.classify_error(&RemoteError::backend(vec![])),
            ErrorClassification::NonRetryable
        );
        assert_eq!(
            manager.classify_error(&RemoteError::QueryNotFound("missing".into())),
            ErrorClassification::NonRetryable
        );
    }

    #[test]
    fn test_retry_decision_max_attempts() {
        let manager = manager(2);
        let error = RemoteError::Network("timeout".into());

        for retries_done in 0..2 {
            match manager.should_retry(&error, retries_done) {
                RetryDecision::Retry { attempt_number, .. } => {
                    assert_eq!(attempt_number, retries_done + 2);
                }
                RetryDecision::Stop { .. } => panic!("Should not stop after {} retries", retries_done),
            }
        }

        match manager.should_retry(&error, 2) {
            RetryDecision::Stop { reason, final_attempt } => {
                assert!(reason.contains("Maximum retry attempts"));
                assert_eq!(final_attempt, 3);
            }
            RetryDecision::Retry { .. } => panic!("Should stop after max attempts"),
        }
    }

    #[test]
    fn test_retry_decision_non_retryable() {
        let manager = RetryManager::default();
        let error = RemoteError::Http { status: 404, body: "not found".into() };

        match manager.should_retry(&error, 0) {
            RetryDecision::Stop { reason, final_attempt } => {
                assert!(reason.contains("not retryable"));
                assert_eq!(final_attempt, 1);
            }
            RetryDecision::Retry { .. } => panic!("Should not retry non-retryable error"),
        }
    }

    #[test]
    fn test_zero_retries_never_retries() {
        let manager = manager(0);
        let decision = manager.should_retry(&RemoteError::Network("down".into()), 0);
        assert!(matches!(decision, RetryDecision::Stop { .. }));
    }

    #[test]
    fn test_delay_strictly_increasing_then_capped() {
        let manager = RetryManager::default();

        assert_eq!(manager.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(manager.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(manager.calculate_delay(2), Duration::from_millis(400));

        let delays: Vec<Duration> = (0..6).map(|n| manager.calculate_delay(n)).collect();
        for pair in delays.windows(2) {
            assert!(pair[1] > pair[0], "{:?} should exceed {:?}", pair[1], pair[0]);
        }
        assert_eq!(manager.calculate_delay(6), Duration::from_millis(5000));
        assert_eq!(manager.calculate_delay(40), Duration::from_millis(5000));
        assert_eq!(manager.calculate_delay(u32::MAX), Duration::from_millis(5000));
    }

    #[test]
    fn test_jitter() {
        let manager = RetryManager::default().with_jitter(true);

        let delays: Vec<u128> = (0..20).map(|_| manager.calculate_delay(3).as_millis()).collect();

        let unique_delays: std::collections::HashSet<_> = delays.iter().collect();
        assert!(unique_delays.len() > 1, "Jitter should produce different delays");
        for delay in delays {
            assert!(delay <= 800, "Jittered delay should not exceed base delay");
        }
    }

    #[test]
    fn test_policy_defaults_from_partial_json() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"maxRetries": 5}"#).unwrap();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay_ms, 100);
        assert_eq!(policy.max_delay_ms, 5000);
        assert_eq!(policy.backoff_multiplier, 2.0);
    }
}
