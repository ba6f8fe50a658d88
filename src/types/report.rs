//! The finalized, port-ordered summary of one scan.

use super::{PortRange, PortState, ProbeOutcome, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// A finalized scan report.
///
/// `outcomes` is sorted by ascending port and holds at most one entry per
/// port. A report with `complete == false` came from a cancelled scan and
/// covers only the probes that actually finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub target: Target,
    pub range: PortRange,
    pub outcomes: Vec<ProbeOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scanned_count: usize,
    pub open_count: usize,
    pub complete: bool,
}

impl ScanReport {
    /// Number of ports the range asked for.
    pub fn total_ports(&self) -> usize {
        self.range.len()
    }

    /// Outcomes for open ports, ascending.
    pub fn open_ports(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|o| o.is_open())
    }

    pub fn closed_count(&self) -> usize {
        self.count_where(|s| matches!(s, PortState::Closed))
    }

    pub fn timed_out_count(&self) -> usize {
        self.count_where(|s| matches!(s, PortState::TimedOut))
    }

    pub fn error_count(&self) -> usize {
        self.count_where(|s| matches!(s, PortState::Error(_)))
    }

    /// Wall-clock time between start and finish.
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    fn count_where(&self, pred: impl Fn(&PortState) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o.state())).count()
    }
}
