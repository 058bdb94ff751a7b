//! Retry policy with linear back-off
//!
//! Transient failures sleep a fixed interval; malformed pages and missing
//! cursors sleep `interval * retry`, so repeated bad pages back off further.
//! All sleeps can be cut short by a cancellation token.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum retries before giving up
    pub retry_max: u32,
    /// Base sleep between retries
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_max: 5,
            interval: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings
    pub fn new(retry_max: u32) -> Self {
        Self {
            retry_max,
            ..Default::default()
        }
    }

    /// Set the base interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the base interval in whole seconds
    pub fn with_interval_secs(self, seconds: u64) -> Self {
        self.with_interval(Duration::from_secs(seconds))
    }

    /// Delay to sleep before attempt number `retry`
    pub fn delay(&self, retry: u32, scale: BackoffScale) -> Duration {
        match scale {
            BackoffScale::Fixed => self.interval,
            BackoffScale::Linear => self.interval.saturating_mul(retry),
        }
    }

    /// Count one more failure and decide whether to try again
    pub fn next_attempt(&self, retry: &mut u32, scale: BackoffScale) -> RetryDecision {
        *retry += 1;
        if *retry > self.retry_max {
            return RetryDecision::Exhausted;
        }
        RetryDecision::Retry {
            delay: self.delay(*retry, scale),
        }
    }
}

/// How the sleep grows with the retry counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffScale {
    /// Same interval every time (transport errors, 5xx, 403)
    Fixed,
    /// `interval * retry` (missing envelope, missing cursor)
    Linear,
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration },
    /// Retry budget is spent
    Exhausted,
}

/// Sleep for `delay` unless `cancel` fires first
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<()> {
    if delay.is_zero() {
        return if cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
