//! Bounded polling with backoff
//!
//! Used by every "await" in the crate: pods becoming scheduled, pods
//! completing. The poll function decides readiness; errors it returns are
//! not retried.

use crate::error::{Result, SubctlError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// How often and for how long to poll
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the second attempt
    pub interval: Duration,
    /// Upper bound for the delay between attempts
    pub max_interval: Duration,
    /// Growth factor applied to the delay after each attempt
    pub multiplier: f64,
    /// Overall deadline
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            multiplier: 1.5,
            timeout: Duration::from_secs(120),
        }
    }
}

impl PollConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Fixed interval, no backoff
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            multiplier: 1.0,
            timeout,
        }
    }
}

/// Poll until `poll_fn` yields a value or the deadline passes.
///
/// `poll_fn` returns `Ok(Some(T))` when done, `Ok(None)` to keep waiting and
/// `Err(_)` to abort immediately.
pub async fn poll_until<T, F, Fut>(
    config: &PollConfig,
    description: &str,
    mut poll_fn: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now().checked_add(config.timeout).ok_or_else(|| {
        SubctlError::InvalidArgument(format!("poll timeout {:?} for {} is too large", config.timeout, description))
    })?;
    let mut delay = config.interval;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        if let Some(value) = poll_fn().await? {
            tracing::debug!(what = %description, attempt, "poll condition met");
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(what = %description, attempt, "poll deadline exceeded");
            return Err(SubctlError::Timeout(format!(
                "{} after {:?}",
                description, config.timeout
            )));
        }

        tracing::trace!(what = %description, attempt, delay_ms = delay.as_millis() as u64, "not ready yet");
        tokio::time::sleep(delay.min(deadline - now)).await;

        delay = Duration::from_secs_f64(
            (delay.as_secs_f64() * config.multiplier).min(config.max_interval.as_secs_f64()),
        );
    }
}
