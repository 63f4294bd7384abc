//! Retry with exponential backoff.
//!
//! The client itself never retries. This module layers retries on top of it:
//! a call factory is re-run while the returned error passes the policy's
//! predicate (by default [`ClientError::is_retryable`]), sleeping an
//! exponentially growing, jittered delay between attempts.
//!
//! # Example
//!
//! ```ignore
//! use basefetch::{HttpClient, RetryPolicy, retry_with_policy};
//! use std::time::Duration;
//!
//! let client = HttpClient::with_base_url("https://api.example.com")?;
//! let policy = RetryPolicy::new().max_retries(5).base_delay(Duration::from_millis(100));
//!
//! let report: DailyReport = retry_with_policy(&policy, || client.get("/reports/daily")).await?;
//! ```
//!
//! # Retryable Errors
//!
//! By default: transport errors (connection refused, reset, TLS) and API
//! errors with status 408, 429, 502, 503 or 504. Everything else, interceptor
//! aborts included, is returned immediately. Use [`RetryPolicy::retry_if`]
//! to replace the predicate.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::ClientError;

/// Default backoff configuration values.
pub mod defaults {
    use std::time::Duration;

    /// Delay before the first retry.
    pub const BASE_DELAY: Duration = Duration::from_millis(200);

    /// Growth factor between consecutive delays.
    pub const MULTIPLIER: f64 = 2.0;

    /// Jitter factor (0.1 means +/- 10%).
    pub const JITTER: f64 = 0.1;

    /// Upper bound for a single delay.
    pub const MAX_DELAY: Duration = Duration::from_secs(10);

    /// Retries after the initial attempt.
    pub const MAX_RETRIES: u32 = 3;
}

type RetryPredicate = Arc<dyn Fn(&ClientError) -> bool + Send + Sync>;

/// Configuration for retry behavior.
///
/// # Example
///
/// ```
/// use basefetch::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(2));
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor between consecutive delays. Must be >= 1.0.
    pub multiplier: f64,
    /// Randomization factor between 0.0 and 1.0.
    pub jitter: f64,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Retries after the initial attempt.
    pub max_retries: u32,
    predicate: Option<RetryPredicate>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("base_delay", &self.base_delay)
            .field("multiplier", &self.multiplier)
            .field("jitter", &self.jitter)
            .field("max_delay", &self.max_delay)
            .field("max_retries", &self.max_retries)
            .field("custom_predicate", &self.predicate.is_some())
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: defaults::BASE_DELAY,
            multiplier: defaults::MULTIPLIER,
            jitter: defaults::JITTER,
            max_delay: defaults::MAX_DELAY,
            max_retries: defaults::MAX_RETRIES,
            predicate: None,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Short delays and a low ceiling, for calls a user is waiting on.
    pub fn aggressive() -> Self {
        Self {
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            max_retries: 5,
            ..Default::default()
        }
    }

    /// Long delays and many attempts, for background refreshes.
    pub fn patient() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_retries: 8,
            ..Default::default()
        }
    }

    /// Set the number of retries after the initial attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the upper bound for a single delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the growth factor. Checked by [`validate`](Self::validate).
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the jitter factor. Checked by [`validate`](Self::validate).
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the default retry predicate.
    ///
    /// ```
    /// use basefetch::RetryPolicy;
    /// use http::StatusCode;
    ///
    /// // Also retry on 500 for a flaky report endpoint.
    /// let policy = RetryPolicy::new().retry_if(|err| {
    ///     err.is_retryable() || err.status() == Some(StatusCode::INTERNAL_SERVER_ERROR)
    /// });
    /// ```
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ClientError) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Whether `err` should be retried under this policy.
    pub fn should_retry(&self, err: &ClientError) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(err),
            None => err.is_retryable(),
        }
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.base_delay > self.max_delay {
            return Err("base_delay must not exceed max_delay");
        }
        if !(self.multiplier >= 1.0) {
            return Err("multiplier must be >= 1.0");
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err("jitter must be between 0.0 and 1.0");
        }
        Ok(())
    }

    /// Create a backoff sequence from this policy.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self)
    }
}

/// Backoff state for one retried operation.
///
/// The un-jittered delay for retry *n* (zero-based) is
/// `min(base * multiplier^n, max_delay)`; jitter then scales it by a random
/// factor in `[1 - jitter, 1 + jitter]`, clamped to `max_delay` again.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    base: f64,
    multiplier: f64,
    jitter: f64,
    max: f64,
    max_retries: u32,
    attempts: u32,
}

impl ExponentialBackoff {
    fn new(policy: &RetryPolicy) -> Self {
        Self {
            base: policy.base_delay.as_secs_f64(),
            multiplier: policy.multiplier,
            jitter: policy.jitter,
            max: policy.max_delay.as_secs_f64(),
            max_retries: policy.max_retries,
            attempts: 0,
        }
    }

    /// Retries handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether another retry is allowed.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_retries
    }

    /// The un-jittered delay for the given zero-based retry.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = (self.base * self.multiplier.powi(exponent)).min(self.max);
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// The next delay, with jitter applied. Advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.attempts).as_secs_f64();
        self.attempts += 1;

        let jittered = if self.jitter > 0.0 {
            let factor = 1.0 + self.jitter * (rand::random::<f64>() * 2.0 - 1.0);
            (delay * factor).min(self.max)
        } else {
            delay
        };
        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Retry a call factory with [`RetryPolicy::default`].
pub async fn retry<F, Fut, T>(f: F) -> Result<T, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    retry_with_policy(&RetryPolicy::default(), f).await
}

/// Retry a call factory under `policy`.
///
/// The factory is called once per attempt. The last error is returned when
/// the policy rejects it or the retries are exhausted.
pub async fn retry_with_policy<F, Fut, T>(policy: &RetryPolicy, f: F) -> Result<T, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    if let Err(msg) = policy.validate() {
        return Err(ClientError::Config(format!("invalid retry policy: {}", msg)));
    }

    let mut backoff = policy.backoff();
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if backoff.can_retry() && policy.should_retry(&err) => {
                let delay = backoff.next_delay();
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    error = %err,
                    attempt = backoff.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
