//! Bounded retry with exponential backoff for eventually-consistent resources.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by the async seams in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a single attempt against a resource that may still be computing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T, E> {
    /// The resource is available.
    Ready(T),
    /// The resource is still being prepared; try again later.
    Pending,
    /// The attempt failed and must not be retried.
    Failed(E),
}

/// Final outcome of [`retry_with_backoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    /// The resource became available.
    Ready(T),
    /// An attempt failed with a non-retryable error.
    Failed(E),
    /// Every attempt reported the resource as pending.
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
    },
}

/// Retry ceiling and initial delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled after every pending attempt.
    pub initial_delay: Duration,
}

impl BackoffPolicy {
    /// Build a policy with an explicit ceiling and initial delay.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Delays slept between attempts, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let sleeps = self.attempts().saturating_sub(1);
        (0..sleeps).map(move |step| {
            self.initial_delay
                .checked_mul(1u32.checked_shl(step).unwrap_or(u32::MAX))
                .unwrap_or(Duration::MAX)
        })
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Async sleep abstraction so polling can be tested without waiting.
pub trait Sleeper {
    /// Suspend the calling task for `duration`.
    fn sleep<'a>(&'a self, duration: Duration) -> BoxFuture<'a, ()>;
}

/// Tokio-backed sleeper used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep<'a>(&'a self, duration: Duration) -> BoxFuture<'a, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Run `operation` until it is ready, fails, or the policy's attempts run out.
///
/// The closure receives the 1-based attempt number. No sleep happens after
/// the final attempt.
pub async fn retry_with_backoff<T, E, F, Fut, S>(
    policy: &BackoffPolicy,
    sleeper: &S,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PollOutcome<T, E>>,
    S: Sleeper + ?Sized,
{
    let attempts = policy.attempts();
    let mut delays = policy.delays();
    for attempt in 1..=attempts {
        match operation(attempt).await {
            PollOutcome::Ready(value) => return RetryOutcome::Ready(value),
            PollOutcome::Failed(error) => return RetryOutcome::Failed(error),
            PollOutcome::Pending => {
                if let Some(delay) = delays.next() {
                    log::warn!(
                        "resource pending on attempt {attempt}/{attempts}; retrying in {}ms",
                        delay.as_millis()
                    );
                    sleeper.sleep(delay).await;
                }
            }
        }
    }
    RetryOutcome::Exhausted { attempts }
}
