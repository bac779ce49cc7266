//! # Bounded Polling
//!
//! Fixed-interval polling with an attempt budget derived from a timeout.
//! Used to wait for the widget script to become ready and for a provider
//! transaction to leave its pending state.
//!
//! Sleeping goes through the [`Delay`] port so the same loop runs on Tokio
//! and in the browser.

use crate::error::CheckoutResult;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Interval and overall bound for a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn from_millis(interval_ms: u64, timeout_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(interval_ms),
            Duration::from_millis(timeout_ms),
        )
    }

    /// Number of checks: one immediately, then one per elapsed interval up to the timeout
    pub fn max_attempts(&self) -> u32 {
        let interval = self.interval.as_millis().max(1);
        let extra = self.timeout.as_millis() / interval;
        u32::try_from(extra).unwrap_or(u32::MAX - 1) + 1
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from_millis(100, 10_000)
    }
}

/// Sleep primitive
#[async_trait(?Send)]
pub trait Delay {
    async fn delay(&self, duration: Duration);
}

/// Tokio timer
#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[cfg(feature = "tokio")]
#[async_trait(?Send)]
impl Delay for TokioDelay {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Call `attempt` until it yields a value, fails, or the attempt budget runs out.
///
/// Returns `Ok(None)` when the budget is exhausted; callers map that to
/// their own timeout error.
pub async fn poll_until<T, F, Fut, D>(
    config: &PollConfig,
    delay: &D,
    mut attempt: F,
) -> CheckoutResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CheckoutResult<Option<T>>>,
    D: Delay + ?Sized,
{
    let max_attempts = config.max_attempts();
    for n in 1..=max_attempts {
        if let Some(value) = attempt().await? {
            return Ok(Some(value));
        }
        if n < max_attempts {
            delay.delay(config.interval).await;
        }
    }
    Ok(None)
}
