//! Order-independent collection of probe outcomes.
//!
//! Outcomes arrive in whatever order probes complete. The aggregator keys
//! them by port, refuses duplicates and produces a port-sorted
//! [`ScanReport`]. `add` takes `&self` and is safe to call from several
//! tasks at once; a single lock serializes the writes.

use crate::error::AggregateError;
use crate::types::{Port, PortRange, ProbeOutcome, ScanReport, Target};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Accumulates outcomes for one scan and finalizes them into a report.
#[derive(Debug)]
pub struct ResultAggregator {
    target: Target,
    range: PortRange,
    started_at: DateTime<Utc>,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    outcomes: BTreeMap<Port, ProbeOutcome>,
    report: Option<ScanReport>,
}

impl ResultAggregator {
    /// Start collecting for `target` over `range`; the start time is now.
    pub fn new(target: Target, range: PortRange) -> Self {
        Self::started_at(target, range, Utc::now())
    }

    pub fn started_at(target: Target, range: PortRange, started_at: DateTime<Utc>) -> Self {
        Self {
            target,
            range,
            started_at,
            state: Mutex::new(State::default()),
        }
    }

    /// Record one outcome.
    ///
    /// Fails if the port was already recorded, lies outside the range, or
    /// the report has been finalized.
    pub fn add(&self, outcome: ProbeOutcome) -> Result<(), AggregateError> {
        let port = outcome.port();
        if !self.range.contains(port) {
            return Err(AggregateError::OutOfRange {
                port,
                range: self.range,
            });
        }

        let mut state = self.lock();
        if state.report.is_some() {
            return Err(AggregateError::Finalized);
        }
        if state.outcomes.contains_key(&port) {
            return Err(AggregateError::Duplicate(port));
        }
        state.outcomes.insert(port, outcome);
        Ok(())
    }

    /// Outcomes recorded so far.
    pub fn len(&self) -> usize {
        self.lock().outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce the report.
    ///
    /// The first call fixes the finish time and freezes the outcome set;
    /// later calls return the same report. If fewer outcomes than the range
    /// size were recorded the report is marked incomplete.
    pub fn finalize(&self) -> ScanReport {
        let mut state = self.lock();
        if let Some(report) = &state.report {
            return report.clone();
        }

        // BTreeMap iteration is already ascending by port.
        let outcomes: Vec<ProbeOutcome> = state.outcomes.values().cloned().collect();
        let open_count = outcomes.iter().filter(|o| o.is_open()).count();
        let scanned_count = outcomes.len();
        let report = ScanReport {
            target: self.target.clone(),
            range: self.range,
            complete: scanned_count == self.range.len(),
            outcomes,
            started_at: self.started_at,
            finished_at: Utc::now(),
            scanned_count,
            open_count,
        };

        state.report = Some(report.clone());
        report
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // The guarded data stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortState;
    use std::sync::Arc;
    use std::time::Duration;

    fn outcome(port: u16, state: PortState) -> ProbeOutcome {
        ProbeOutcome::new(Port::new(port).unwrap(), state, Duration::from_millis(1))
    }

    fn aggregator(start: u32, end: u32) -> ResultAggregator {
        ResultAggregator::new(Target::new("host"), PortRange::new(start, end).unwrap())
    }

    #[test]
    fn test_finalize_sorts_and_counts() {
        let agg = aggregator(20, 25);
        for port in [25, 22, 20, 24, 21, 23] {
            let state = if port == 22 {
                PortState::Open
            } else {
                PortState::Closed
            };
            agg.add(outcome(port, state)).unwrap();
        }

        let report = agg.finalize();
        let ports: Vec<u16> = report.outcomes.iter().map(|o| o.port().as_u16()).collect();
        assert_eq!(ports, vec![20, 21, 22, 23, 24, 25]);
        assert_eq!(report.open_count, 1);
        assert_eq!(report.scanned_count, 6);
        assert!(report.complete);
    }

    #[test]
    fn test_duplicate_rejected() {
        let agg = aggregator(1, 10);
        agg.add(outcome(5, PortState::Closed)).unwrap();
        assert_eq!(
            agg.add(outcome(5, PortState::Open)),
            Err(AggregateError::Duplicate(Port::new(5).unwrap()))
        );
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let agg = aggregator(1, 10);
        assert!(matches!(
            agg.add(outcome(11, PortState::Closed)),
            Err(AggregateError::OutOfRange { .. })
        ));
        assert!(agg.is_empty());
    }

    #[test]
    fn test_partial_report_marked_incomplete() {
        let agg = aggregator(1, 10);
        agg.add(outcome(3, PortState::TimedOut)).unwrap();
        let report = agg.finalize();
        assert!(!report.complete);
        assert_eq!(report.scanned_count, 1);
        assert_eq!(report.total_ports(), 10);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let agg = aggregator(80, 80);
        agg.add(outcome(80, PortState::Open)).unwrap();
        let first = agg.finalize();
        let second = agg.finalize();
        assert_eq!(first, second);
        assert_eq!(
            agg.add(outcome(80, PortState::Open)),
            Err(AggregateError::Finalized)
        );
    }

    #[test]
    fn test_concurrent_adds() {
        let agg = Arc::new(aggregator(1, 400));
        let handles: Vec<_> = (0..4u16)
            .map(|worker| {
                let agg = Arc::clone(&agg);
                std::thread::spawn(move || {
                    for port in (1..=100u16).map(|i| worker * 100 + i) {
                        agg.add(outcome(port, PortState::Closed)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let report = agg.finalize();
        assert!(report.complete);
        assert!(report
            .outcomes
            .windows(2)
            .all(|w| w[0].port() < w[1].port()));
    }
}
