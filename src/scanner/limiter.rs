//! Admission control for in-flight probes.
//!
//! Every probe holds a [`Permit`] for its whole connection attempt, so the
//! number of open sockets never exceeds the configured maximum. Permits come
//! from a tokio [`Semaphore`], which hands them out in request order.

use super::rate_limiter::RateLimiter;
use crate::error::{ScanError, ScanResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default cap on simultaneous probes. Stays well under the usual
/// 1024 open-file soft limit.
pub const DEFAULT_MAX_CONCURRENCY: usize = 500;

/// Bounds the number of concurrently outstanding probes.
///
/// Cloning is cheap and clones share the same permits and counters.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max: usize,
    gauge: Arc<InFlight>,
    pacer: Option<RateLimiter>,
}

#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyLimiter {
    /// Create a limiter admitting at most `max` probes at once.
    pub fn new(max: usize) -> ScanResult<Self> {
        if max == 0 {
            return Err(ScanError::InvalidInput(
                "max concurrency must be at least 1".to_string(),
            ));
        }
        let max = max.min(Semaphore::MAX_PERMITS);
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
            gauge: Arc::new(InFlight::default()),
            pacer: None,
        })
    }

    /// Also pace admissions with a token bucket.
    pub fn with_pacing(mut self, pacer: Option<RateLimiter>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Wait for a free slot.
    ///
    /// Waiters are served first come, first served. With pacing enabled the
    /// caller additionally waits for a rate token after the slot is granted.
    pub async fn acquire(&self) -> ScanResult<Permit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ScanError::LimiterClosed)?;

        if let Some(pacer) = &self.pacer {
            pacer.wait().await;
        }

        let now = self.gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);

        Ok(Permit {
            _permit: permit,
            gauge: Arc::clone(&self.gauge),
        })
    }

    /// Return a slot. Equivalent to dropping the permit.
    pub fn release(&self, permit: Permit) {
        drop(permit);
    }

    /// Configured maximum.
    pub fn max_concurrency(&self) -> usize {
        self.max
    }

    /// Probes currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.gauge.current.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.gauge.peak.load(Ordering::SeqCst)
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// A granted slot. The slot is returned when the permit is dropped.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
    gauge: Arc<InFlight>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so the gauge
        // never lags behind a newly admitted probe.
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(
            ConcurrencyLimiter::new(0),
            Err(ScanError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let limiter = ConcurrencyLimiter::new(2).unwrap();
        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);
        assert_eq!(limiter.available(), 0);

        limiter.release(a);
        assert_eq!(limiter.in_flight(), 1);
        drop(b);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak_in_flight(), 2);
    }

    #[test]
    fn test_acquire_waits_for_release() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let held = tokio_test::block_on(limiter.acquire()).unwrap();

        let mut waiting = tokio_test::task::spawn(limiter.acquire());
        tokio_test::assert_pending!(waiting.poll());

        drop(held);
        assert!(waiting.is_woken());
        let permit = tokio_test::assert_ready_ok!(waiting.poll());
        assert_eq!(limiter.in_flight(), 1);
        drop(permit);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_permits_granted_in_request_order() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let held = limiter.acquire().await.unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let mut handles = Vec::new();
        for id in 0..5 {
            let limiter = limiter.clone();
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let permit = limiter.acquire().await.unwrap();
                tx.send(id).unwrap();
                drop(permit);
            }));
            // Let each task queue up before spawning the next.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        drop(tx);
        drop(held);

        for handle in handles {
            handle.await.unwrap();
        }
        let mut order = Vec::new();
        while let Some(id) = rx.recv().await {
            order.push(id);
        }
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
