//! CSV output formatting.

use crate::types::{PortState, ScanReport};
use std::io::{self, Write};

/// Print results in CSV format.
pub fn print_csv(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    write_csv(stdout.lock(), report)
}

/// Write one row per probed port.
pub fn write_csv(out: impl Write, report: &ScanReport) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["port", "state", "elapsed_ms", "detail"])?;

    for outcome in &report.outcomes {
        let (state, detail) = match outcome.state() {
            PortState::Open => ("open", ""),
            PortState::Closed => ("closed", ""),
            PortState::TimedOut => ("timed_out", ""),
            PortState::Error(detail) => ("error", detail.as_str()),
        };
        wtr.write_record([
            outcome.port().to_string().as_str(),
            state,
            outcome.elapsed().as_millis().to_string().as_str(),
            detail,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
