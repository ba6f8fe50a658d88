//! Dispatch pacing for scans.
//!
//! A token bucket caps how many probes may start per second. It is layered
//! on top of the concurrency limiter: the limiter bounds how many probes are
//! open at once, the pacer bounds how fast new ones begin.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// A shared token-bucket rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<GovLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    rate: NonZeroU32,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` dispatches per second.
    ///
    /// Returns `None` for a rate of 0, which means "unlimited".
    pub fn new(rate: u32) -> Option<Self> {
        let rate = NonZeroU32::new(rate)?;
        // The bucket holds one second's worth of tokens, so the first
        // `rate` dispatches go out back to back.
        Some(Self {
            limiter: Arc::new(GovLimiter::direct(Quota::per_second(rate))),
            rate,
        })
    }

    /// Dispatches allowed per second.
    pub fn rate(&self) -> u32 {
        self.rate.get()
    }

    /// Wait until a token is available.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}
