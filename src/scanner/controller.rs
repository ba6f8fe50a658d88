//! End-to-end scan orchestration.
//!
//! ```text
//! Idle -> Resolving -> Scanning -> Completed | Cancelled
//!   \         \
//!    `---------`-----> Failed   (invalid input, resolution error)
//! ```
//!
//! Once scanning starts, per-port failures never fail the scan; they are
//! recorded as outcomes. Cancellation (explicit or deadline) stops new
//! dispatches, waits for in-flight probes and finalizes a partial report.

use super::aggregator::ResultAggregator;
use super::limiter::ConcurrencyLimiter;
use super::probe::{Prober, TcpProber};
use super::rate_limiter::RateLimiter;
use super::resolver::{AddressResolver, DnsResolver};
use super::scheduler::ScanScheduler;
use super::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::types::{PortRange, ProbeOutcome, ScanReport, Target, TargetError};
use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Idle,
    Resolving,
    Scanning,
    Completed,
    Cancelled,
    Failed,
}

impl ScanState {
    /// True for the three end states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Scanning => "scanning",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What to scan: a host and an inclusive port span, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub target: String,
    pub start: u32,
    pub end: u32,
}

impl ScanRequest {
    pub fn range(target: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            target: target.into(),
            start,
            end,
        }
    }

    /// A single port is a range of one.
    pub fn port(target: impl Into<String>, port: u32) -> Self {
        Self::range(target, port, port)
    }

    /// Ports 1-65535.
    pub fn all(target: impl Into<String>) -> Self {
        let all = PortRange::all();
        Self::range(
            target,
            u32::from(all.start().as_u16()),
            u32::from(all.end().as_u16()),
        )
    }
}

/// In-flight state of one scan. Dropped once the report is finalized.
struct ScanJob {
    aggregator: ResultAggregator,
}

impl ScanJob {
    fn new(target: Target, range: PortRange) -> Self {
        Self {
            aggregator: ResultAggregator::new(target, range),
        }
    }

    fn record(&self, outcome: ProbeOutcome) -> ScanResult<()> {
        self.aggregator.add(outcome).map_err(|e| {
            tracing::error!(error = %e, "outcome rejected by aggregator");
            ScanError::from(e)
        })
    }

    fn finish(self) -> ScanReport {
        self.aggregator.finalize()
    }
}

/// Owns one scan from input validation to the final report.
///
/// A controller runs a single scan; build a new one for the next.
pub struct ScanController {
    resolver: Arc<dyn AddressResolver>,
    prober: Arc<dyn Prober>,
    config: ScanConfig,
    state: watch::Sender<ScanState>,
    started: AtomicBool,
    resolved: OnceLock<Target>,
}

impl ScanController {
    pub fn new(
        resolver: impl AddressResolver + 'static,
        prober: impl Prober + 'static,
        config: ScanConfig,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            resolver: Arc::new(resolver),
            prober: Arc::new(prober),
            config,
            state,
            started: AtomicBool::new(false),
            resolved: OnceLock::new(),
        }
    }

    /// A controller that resolves through DNS and probes with TCP connects.
    pub fn tcp(config: ScanConfig) -> Self {
        Self::new(DnsResolver::new(), TcpProber::new(), config)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// The resolved target. Set before the controller enters
    /// [`ScanState::Scanning`].
    pub fn target(&self) -> Option<&Target> {
        self.resolved.get()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// Stop dispatching and finalize a partial report.
    pub fn cancel(&self) {
        self.config.cancel.cancel();
    }

    /// The token that cancels this scan.
    pub fn cancel_token(&self) -> CancellationToken {
        self.config.cancel.clone()
    }

    /// Run the scan to completion or cancellation.
    ///
    /// Errors only for invalid input, an unresolvable target or an
    /// aggregation invariant violation. A cancelled scan is `Ok` with a
    /// report whose `complete` flag is false.
    pub async fn run(&self, request: ScanRequest) -> ScanResult<ScanReport> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ScanError::AlreadyStarted);
        }

        match self.execute(request).await {
            Ok(report) => {
                let end = if report.complete {
                    ScanState::Completed
                } else {
                    ScanState::Cancelled
                };
                tracing::info!(
                    target_host = %report.target,
                    scanned = report.scanned_count,
                    total = report.total_ports(),
                    open = report.open_count,
                    "scan {}",
                    end
                );
                self.transition(end);
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "scan failed");
                self.transition(ScanState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&self, request: ScanRequest) -> ScanResult<ScanReport> {
        let range = PortRange::new(request.start, request.end)?;
        self.config.validate()?;
        let mut target = Target::new(request.target);
        if target.hostname().is_empty() {
            return Err(TargetError::Empty.into());
        }

        self.transition(ScanState::Resolving);
        let address = self.resolver.resolve(target.hostname()).await?;
        target.set_address(address)?;

        let limiter = ConcurrencyLimiter::new(self.config.max_concurrency)?
            .with_pacing(RateLimiter::new(self.config.rate_limit));
        let scheduler = ScanScheduler::new(Arc::clone(&self.prober), limiter, self.config.timeout);

        // Deadline expiry cancels only this scan's child token, so the
        // caller's token stays untouched.
        let scan_cancel = self.config.cancel.child_token();
        let deadline = self.config.deadline.map(|limit| {
            let token = scan_cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                tracing::warn!(?limit, "scan deadline expired");
                token.cancel();
            })
        });

        let job = ScanJob::new(target.clone(), range);
        let _ = self.resolved.set(target.clone());
        self.transition(ScanState::Scanning);
        let mut outcomes = scheduler.run(
            &target,
            range,
            self.config.progress.clone(),
            scan_cancel.clone(),
        )?;

        let mut recorded = Ok(());
        while let Some(outcome) = outcomes.next().await {
            recorded = job.record(outcome);
            if recorded.is_err() {
                break;
            }
        }
        drop(outcomes);

        if let Some(timer) = deadline {
            timer.abort();
        }
        recorded?;

        if self.config.cancel.is_cancelled() {
            tracing::warn!("scan cancelled by request");
        }
        Ok(job.finish())
    }

    fn transition(&self, next: ScanState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(from = %previous, to = %next, "scan state");
    }
}

impl fmt::Debug for ScanController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanController")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
