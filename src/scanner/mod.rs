//! Scanner module - the concurrent scanning engine.
//!
//! Data flows from the [`ScanController`] through the [`AddressResolver`]
//! (once), the [`ScanScheduler`] (one dispatch per port), the
//! [`ConcurrencyLimiter`] (admission), the [`Prober`] (one connection
//! attempt) and finally into the [`ResultAggregator`].

pub mod aggregator;
pub mod controller;
pub mod limiter;
pub mod probe;
pub mod rate_limiter;
pub mod resolver;
pub mod scheduler;

use crate::error::{ScanError, ScanResult};
use crate::types::ProbeOutcome;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use aggregator::ResultAggregator;
pub use controller::{ScanController, ScanRequest, ScanState};
pub use limiter::{ConcurrencyLimiter, Permit, DEFAULT_MAX_CONCURRENCY};
pub use probe::{Prober, TcpProber};
pub use rate_limiter::RateLimiter;
pub use resolver::{AddressResolver, DnsResolver};
pub use scheduler::ScanScheduler;

/// Default per-probe connection timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

/// A progress notification, sent once per completed probe.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Probes finished so far, including this one.
    pub completed: usize,
    /// Ports in the scanned range.
    pub total: usize,
    /// The outcome that just arrived.
    pub outcome: &'a ProbeOutcome,
}

impl Progress<'_> {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        self.completed as f64 / self.total.max(1) as f64
    }
}

/// Progress callback. Invoked from the scanning task in completion order.
pub type ProgressFn = Arc<dyn Fn(&Progress<'_>) + Send + Sync>;

/// Configuration for a scan.
#[derive(Clone)]
pub struct ScanConfig {
    /// Per-probe connection timeout.
    pub timeout: Duration,
    /// Maximum probes in flight at once.
    pub max_concurrency: usize,
    /// Probe dispatches per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Overall scan deadline. Expiry cancels the scan.
    pub deadline: Option<Duration>,
    /// Called after every completed probe.
    pub progress: Option<ProgressFn>,
    /// Cancelling this token stops the scan and yields a partial report.
    pub cancel: CancellationToken,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            rate_limit: 0,
            deadline: None,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the concurrency cap.
    pub fn with_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Set the dispatch rate (0 = unlimited).
    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limit = per_second;
        self
    }

    /// Set an overall deadline.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Install a progress callback.
    pub fn with_progress(mut self, progress: impl Fn(&Progress<'_>) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reject settings a scan cannot run with.
    pub fn validate(&self) -> ScanResult<()> {
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidInput(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ScanError::InvalidInput(
                "max concurrency must be at least 1".to_string(),
            ));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ScanError::InvalidInput(
                "deadline must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("timeout", &self.timeout)
            .field("max_concurrency", &self.max_concurrency)
            .field("rate_limit", &self.rate_limit)
            .field("deadline", &self.deadline)
            .field("progress", &self.progress.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
