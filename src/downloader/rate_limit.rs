//! Request spacing for the provider's per-token rate ceiling
//!
//! The limiter remembers when it last granted a permit and hands out the next
//! one no earlier than a period later. Callers queue on the lock, so
//! concurrent `ready()` calls are released one per period. Idle time is not
//! banked: after an idle stretch only a single permit is available
//! immediately.
//!
//! No runtime resource is held between calls, so one limiter can serve
//! callers on several runtimes over its lifetime.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Minimum-interval rate limiter
///
/// Owned by an [`Executor`](crate::downloader::Executor) (usually behind an
/// `Arc`), never a process-wide singleton.
#[derive(Debug)]
pub struct RateLimiter {
    period: Duration,
    // When the previous permit was granted.
    last_permit: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter releasing one request per `period`
    ///
    /// # Panics
    /// Panics if `period` is zero.
    pub fn new(period: Duration) -> Self {
        assert!(!period.is_zero(), "rate limiter period must be non-zero");
        Self {
            period,
            last_permit: Mutex::new(None),
        }
    }

    /// Minimum spacing between two permits
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait until the next request may start
    ///
    /// The first call returns immediately. Every later call returns at least
    /// one period after the previous one returned. The lock only guards the
    /// wait itself and is released before the caller issues its request.
    ///
    /// # Returns
    /// How long the caller waited for its permit
    pub async fn ready(&self) -> Duration {
        let started = Instant::now();
        {
            let mut last_permit = self.last_permit.lock().await;
            if let Some(last) = *last_permit {
                let next = last + self.period;
                if next > Instant::now() {
                    sleep_until(next).await;
                }
            }
            *last_permit = Some(Instant::now());
        }
        let waited = started.elapsed();
        trace!(
            waited_us = u64::try_from(waited.as_micros()).unwrap_or(u64::MAX),
            "rate limiter permit granted"
        );
        waited
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(crate::downloader::config::DEFAULT_RATE_INTERVAL)
    }
}
