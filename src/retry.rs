//! Bounded fixed-interval retry
//!
//! Link and broker bring-up share one loop shape: try a fixed number of
//! times, sleeping a fixed interval between attempts, and stop at the
//! first success. No exponential backoff - on a battery budget the loop
//! must complete within the cycle period, so attempts are bounded and
//! evenly spaced.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;

/// Boxed attempt future, borrowed from the retry target for one attempt.
pub type AttemptFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// A bounded retry budget with a fixed interval between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Run `attempt` against `target` until it reports success or the
    /// budget is exhausted. Returns true on the first success. The
    /// interval is slept between attempts, not after the last one.
    pub async fn run<T, F>(&self, target: &mut T, mut attempt: F) -> bool
    where
        T: ?Sized,
        F: for<'a> FnMut(&'a mut T) -> AttemptFuture<'a>,
    {
        for n in 1..=self.max_attempts {
            if attempt(target).await {
                return true;
            }
            if n < self.max_attempts && !self.interval.is_zero() {
                sleep(self.interval).await;
            }
        }
        false
    }
}
