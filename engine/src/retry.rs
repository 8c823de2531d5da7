//! Retry engine with exponential backoff
//!
//! Wraps any async operation in a bounded attempt loop. Delays grow
//! exponentially and are jitter-free: before attempt n the engine sleeps
//! `min(initial_delay * factor^(n-2), max_delay)`, with no delay before the
//! first attempt. When every attempt fails, the event (when one is in scope)
//! is handed to the dead-letter escalator and the original error is
//! re-raised to the caller.

use crate::config::Config;
use crate::dead_letter::DeadLetterEscalator;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use virta_core::{Event, ProcessError};

/// Exponential backoff parameters
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Multiplier applied per failed attempt
    pub factor: f64,
    /// Total attempts, the first one included
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(30),
            factor: 2.0,
            max_attempts: 3,
        }
    }
}

impl BackoffPolicy {
    /// Build a policy from engine configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_delay: config.initial_delay(),
            max_delay: config.max_delay(),
            factor: config.backoff_factor,
            max_attempts: config.max_attempts,
        }
    }

    /// Delay to wait before making attempt `attempt` (1-based)
    ///
    /// Attempt 1 runs immediately. Attempt n waits
    /// `min(initial_delay * factor^(n-2), max_delay)`, so with the defaults
    /// the delays before attempts 2, 3, 4, 5 are 1s, 2s, 4s, 8s.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        // Microseconds keep sub-millisecond test delays exact
        let base_us =
            self.initial_delay.as_micros() as f64 * self.factor.powi((attempt - 2) as i32);
        let capped_us = base_us.min(self.max_delay.as_micros() as f64);

        Duration::from_micros(capped_us as u64)
    }
}

/// Runs operations under a bounded retry loop with dead-letter escalation
///
/// # Example
///
/// ```ignore
/// let runner = RetryRunner::new(BackoffPolicy::default())
///     .with_dead_letter(escalator.clone());
///
/// runner
///     .execute_with_retry(|| process(&event), "handle order event", Some(&event))
///     .await?;
/// ```
pub struct RetryRunner {
    policy: BackoffPolicy,
    dead_letter: Option<Arc<DeadLetterEscalator>>,
    /// Metrics: total retry attempts (sleeps taken)
    retries: AtomicU64,
    /// Metrics: operations that succeeded after at least one failure
    recoveries: AtomicU64,
}

impl RetryRunner {
    /// Create a runner with the given backoff policy and no dead-letter sink
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            dead_letter: None,
            retries: AtomicU64::new(0),
            recoveries: AtomicU64::new(0),
        }
    }

    /// Attach a dead-letter sink for exhausted events
    pub fn with_dead_letter(mut self, escalator: Arc<DeadLetterEscalator>) -> Self {
        self.dead_letter = Some(escalator);
        self
    }

    /// Backoff policy in force
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Total retry attempts taken
    pub fn retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Operations that recovered after at least one failed attempt
    pub fn recovered_count(&self) -> u64 {
        self.recoveries.load(Ordering::Relaxed)
    }

    /// Invoke `operation` up to `max_attempts` times
    ///
    /// Returns the first success. On exhaustion, escalates `event` to the
    /// dead-letter sink when both are present, then re-raises the error from
    /// the final attempt. Escalation failures never mask that error.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: F,
        context: &str,
        event: Option<&Event>,
    ) -> Result<T, ProcessError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ProcessError>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            let delay = self.policy.delay_for_attempt(attempt);
            if !delay.is_zero() {
                self.retries.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    context,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying operation"
                );
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        self.recoveries.fetch_add(1, Ordering::Relaxed);
                        tracing::info!(context, attempt, "operation recovered after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(
                        context,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "operation failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        let error = last_error.unwrap_or_else(|| ProcessError::Stage {
            stage: "retry",
            message: "no attempts were made".into(),
        });

        if let (Some(event), Some(dead_letter)) = (event, &self.dead_letter) {
            dead_letter
                .escalate(event, &error, self.policy.max_attempts)
                .await;
        }

        tracing::error!(
            context,
            attempts = self.policy.max_attempts,
            error = %error,
            "retries exhausted"
        );
        Err(error)
    }
}
