//! Bounded retry of fallible async network calls
//!
//! A [`RetryPolicy`] decides how many attempts a call gets, how long to wait
//! between attempts, and which errors are worth retrying at all. The default
//! policy is a fixed delay that retries every error.

use backoff::backoff::Backoff as Schedule;
use eyre::{ensure, Report, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Whether a failed attempt may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Try again after the backoff delay
    Retryable,
    /// Surface immediately
    Fatal,
}

/// Classifier deciding whether an error is retryable
pub type Classifier = fn(&Report) -> ErrorClass;

/// Treats every error as retryable
pub fn retry_everything(_: &Report) -> ErrorClass {
    ErrorClass::Retryable
}

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial * multiplier^n`, capped at `max`
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay before retry number `retry` (0 = before the second attempt)
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let factor = multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
                let scaled = initial.as_secs_f64() * factor;
                if !scaled.is_finite() || scaled >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(scaled)
                }
            }
        }
    }
}

/// Retry policy: attempt bound, delay schedule and error classification
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one (>= 1)
    pub max_attempts: u32,
    /// Delay schedule
    pub backoff: Backoff,
    classify: Classifier,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Fixed delay between attempts, every error retried
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
            classify: retry_everything,
        }
    }

    /// Exponentially growing delay, every error retried
    pub fn exponential(max_attempts: u32, initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                initial,
                multiplier,
                max,
            },
            classify: retry_everything,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Replace the error classifier
    pub fn with_classifier(mut self, classify: Classifier) -> Self {
        self.classify = classify;
        self
    }

    /// Classify an error with this policy
    pub fn classify(&self, err: &Report) -> ErrorClass {
        (self.classify)(err)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_attempts >= 1, "Retry policy needs at least one attempt");
        Ok(())
    }

    fn schedule(&self) -> AttemptSchedule {
        AttemptSchedule {
            backoff: self.backoff,
            max_attempts: self.max_attempts,
            retries: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(
            crate::constants::DEFAULT_MAX_ATTEMPTS,
            crate::constants::DEFAULT_RETRY_DELAY,
        )
    }
}

/// `backoff` schedule that stops after `max_attempts - 1` retries
struct AttemptSchedule {
    backoff: Backoff,
    max_attempts: u32,
    retries: u32,
}

impl Schedule for AttemptSchedule {
    fn reset(&mut self) {
        self.retries = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries.saturating_add(1) >= self.max_attempts {
            return None;
        }
        let delay = self.backoff.delay(self.retries);
        self.retries += 1;
        Some(delay)
    }
}

/// Run `op` under `policy`, returning the first success or the last error
///
/// `label` names the operation in retry warnings.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    policy.validate()?;

    let classify = policy.classify;
    let max_attempts = policy.max_attempts;
    let mut failures = 0u32;

    backoff::future::retry_notify(
        policy.schedule(),
        || {
            let attempt = op();
            async move {
                attempt.await.map_err(|err| match classify(&err) {
                    ErrorClass::Retryable => backoff::Error::transient(err),
                    ErrorClass::Fatal => backoff::Error::permanent(err),
                })
            }
        },
        |err: Report, delay: Duration| {
            failures += 1;
            warn!(
                operation = label,
                attempt = failures,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Error occurred, retrying: {:#}",
                err
            );
        },
    )
    .await
}
