//! Port enumeration and probe dispatch.
//!
//! The scheduler walks a range in ascending order, admits each port through
//! the [`ConcurrencyLimiter`] and yields outcomes as probes finish. Outcomes
//! arrive in completion order, not port order.

use super::limiter::ConcurrencyLimiter;
use super::probe::Prober;
use super::{Progress, ProgressFn};
use crate::error::ScanResult;
use crate::types::{Port, PortRange, ProbeOutcome, Target};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Dispatches probes for a port range under a concurrency limit.
#[derive(Clone)]
pub struct ScanScheduler {
    prober: Arc<dyn Prober>,
    limiter: ConcurrencyLimiter,
    timeout: Duration,
}

impl ScanScheduler {
    pub fn new(prober: Arc<dyn Prober>, limiter: ConcurrencyLimiter, timeout: Duration) -> Self {
        Self {
            prober,
            limiter,
            timeout,
        }
    }

    /// Build the outcome stream for one scan.
    ///
    /// The stream is lazy: nothing is probed until it is polled, and each
    /// call builds a fresh one. Once `cancel` fires no further probe is
    /// started, probes already connecting run to their own timeout, and the
    /// stream ends after the last of them reports. `progress` is called once
    /// per emitted outcome with a strictly increasing completed count.
    ///
    /// Fails only if `target` has not been resolved yet.
    pub fn run(
        &self,
        target: &Target,
        range: PortRange,
        progress: Option<ProgressFn>,
        cancel: CancellationToken,
    ) -> ScanResult<BoxStream<'static, ProbeOutcome>> {
        let address = target.require_address()?;
        let total = range.len();
        let width = self.limiter.max_concurrency().min(total);
        let timeout = self.timeout;
        let prober = Arc::clone(&self.prober);
        let limiter = self.limiter.clone();
        let stop = cancel.clone().cancelled_owned();
        let mut completed = 0usize;

        tracing::debug!(%address, %range, width, ?timeout, "dispatching probes");

        let outcomes = stream::iter(range.iter())
            .take_until(stop)
            .map(move |port| {
                dispatch(
                    Arc::clone(&prober),
                    limiter.clone(),
                    cancel.clone(),
                    address,
                    port,
                    timeout,
                )
            })
            .buffer_unordered(width)
            .filter_map(future::ready)
            .inspect(move |outcome| {
                completed += 1;
                if let Some(report) = &progress {
                    report(&Progress {
                        completed,
                        total,
                        outcome,
                    });
                }
            });

        Ok(outcomes.boxed())
    }
}

/// Acquire a slot, probe, release. Yields nothing if the scan was
/// cancelled before the probe could start.
async fn dispatch(
    prober: Arc<dyn Prober>,
    limiter: ConcurrencyLimiter,
    cancel: CancellationToken,
    address: IpAddr,
    port: Port,
    timeout: Duration,
) -> Option<ProbeOutcome> {
    let permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        permit = limiter.acquire() => permit,
    };
    let permit = match permit {
        Ok(permit) => permit,
        Err(e) => {
            tracing::error!(%port, error = %e, "could not admit probe");
            return None;
        }
    };
    // Pacing may have kept us waiting across a cancellation.
    if cancel.is_cancelled() {
        return None;
    }

    let outcome = prober.probe(address, port, timeout).await;
    limiter.release(permit);
    tracing::debug!(%port, state = %outcome.state(), "probe complete");
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortState;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    struct OpenOn(u16);

    #[async_trait]
    impl Prober for OpenOn {
        async fn probe(&self, _: IpAddr, port: Port, _: Duration) -> ProbeOutcome {
            let state = if port.as_u16() == self.0 {
                PortState::Open
            } else {
                PortState::Closed
            };
            ProbeOutcome::new(port, state, Duration::ZERO)
        }
    }

    fn resolved() -> Target {
        let mut target = Target::new("localhost");
        target
            .set_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .unwrap();
        target
    }

    fn scheduler(max: usize) -> ScanScheduler {
        ScanScheduler::new(
            Arc::new(OpenOn(22)),
            ConcurrencyLimiter::new(max).unwrap(),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn test_unresolved_target_rejected() {
        let result = scheduler(4).run(
            &Target::new("localhost"),
            PortRange::new(1, 2).unwrap(),
            None,
            CancellationToken::new(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_one_outcome_per_port() {
        let outcomes: Vec<ProbeOutcome> = scheduler(4)
            .run(
                &resolved(),
                PortRange::new(20, 25).unwrap(),
                None,
                CancellationToken::new(),
            )
            .unwrap()
            .collect()
            .await;

        let mut ports: Vec<u16> = outcomes.iter().map(|o| o.port().as_u16()).collect();
        ports.sort_unstable();
        assert_eq!(ports, vec![20, 21, 22, 23, 24, 25]);
        assert_eq!(outcomes.iter().filter(|o| o.is_open()).count(), 1);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressFn = Arc::new(move |p: &Progress<'_>| {
            sink.lock().unwrap().push((p.completed, p.total));
        });

        let count = scheduler(3)
            .run(
                &resolved(),
                PortRange::new(1, 10).unwrap(),
                Some(progress),
                CancellationToken::new(),
            )
            .unwrap()
            .count()
            .await;

        assert_eq!(count, 10);
        let seen = seen.lock().unwrap();
        let expected: Vec<(usize, usize)> = (1..=10).map(|n| (n, 10)).collect();
        assert_eq!(*seen, expected);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_probes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let count = scheduler(8)
            .run(&resolved(), PortRange::new(1, 100).unwrap(), None, cancel)
            .unwrap()
            .count()
            .await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_stream_is_restartable() {
        let scheduler = scheduler(2);
        let target = resolved();
        let range = PortRange::single(Port::new(22).unwrap());

        for _ in 0..2 {
            let outcomes: Vec<ProbeOutcome> = scheduler
                .run(&target, range, None, CancellationToken::new())
                .unwrap()
                .collect()
                .await;
            assert_eq!(outcomes.len(), 1);
            assert!(outcomes[0].is_open());
        }
    }
}
