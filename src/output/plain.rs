//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::types::{PortRange, ScanReport, Target};
use console::style;
use std::io::{self, Write};

/// Print results in human-readable plain text format.
pub fn print_plain(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    write_plain(&mut stdout.lock(), report)
}

/// Write the plain summary to any writer.
pub fn write_plain(out: &mut impl Write, report: &ScanReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        style("Scan report for").bold(),
        report.target
    )?;
    if report.complete {
        writeln!(out, "{}", style("Scan Complete!").green().bold())?;
    } else {
        writeln!(
            out,
            "{} {} of {} ports probed",
            style("Scan Cancelled!").yellow().bold(),
            report.scanned_count,
            report.total_ports()
        )?;
    }
    writeln!(
        out,
        "Found {} port(s) open",
        style(report.open_count).green().bold()
    )?;
    writeln!(out)?;

    writeln!(out, "{}", style("Scan Summary").bold())?;
    writeln!(out, "-------------")?;
    if report.open_count == 0 {
        writeln!(out, "All ports were closed!")?;
    } else {
        for outcome in report.open_ports() {
            writeln!(
                out,
                "Port {} is {}",
                outcome.port(),
                style("open").green().bold()
            )?;
        }
    }
    writeln!(out)?;

    writeln!(
        out,
        "  {} {} closed, {} timed out, {} errors in {:.2}s",
        style("Statistics:").bold(),
        style(report.closed_count()).red(),
        style(report.timed_out_count()).yellow(),
        report.error_count(),
        report.duration().as_secs_f64()
    )?;
    writeln!(out)?;

    Ok(())
}

/// Print a scan header once the target is resolved.
pub fn print_scan_header(target: &Target, range: PortRange) -> io::Result<()> {
    let stdout = io::stdout();
    write_scan_header(&mut stdout.lock(), target, range)
}

/// Write the scan header to any writer.
pub fn write_scan_header(out: &mut impl Write, target: &Target, range: PortRange) -> io::Result<()> {
    writeln!(out)?;
    match target.address() {
        Some(ip) => writeln!(
            out,
            "{} {} [{}]",
            style("Scanning host").cyan(),
            style(ip).white().bold(),
            target.hostname()
        )?,
        None => writeln!(
            out,
            "{} {}",
            style("Scanning host").cyan(),
            style(target.hostname()).white().bold()
        )?,
    }
    writeln!(
        out,
        "{} Ports {} ({} total)",
        style("•").dim(),
        range,
        style(range.len()).white().bold()
    )?;
    writeln!(out)?;
    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ResultAggregator;
    use crate::types::{Port, PortState, ProbeOutcome, Target};
    use std::time::Duration;

    fn render(states: &[(u16, PortState)], start: u32, end: u32) -> String {
        console::set_colors_enabled(false);
        let agg = ResultAggregator::new(Target::new("host"), PortRange::new(start, end).unwrap());
        for (port, state) in states {
            agg.add(ProbeOutcome::new(
                Port::new(*port).unwrap(),
                state.clone(),
                Duration::ZERO,
            ))
            .unwrap();
        }
        let mut buf = Vec::new();
        write_plain(&mut buf, &agg.finalize()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_open_ports_listed() {
        let text = render(
            &[(21, PortState::Closed), (22, PortState::Open), (23, PortState::TimedOut)],
            21,
            23,
        );
        assert!(text.contains("Scan Complete!"));
        assert!(text.contains("Found 1 port(s) open"));
        assert!(text.contains("Port 22 is open"));
        assert!(text.contains("1 closed, 1 timed out, 0 errors"));
    }

    #[test]
    fn test_header_shows_address_and_hostname() {
        console::set_colors_enabled(false);
        let mut target = Target::new("example.com");
        target.set_address("93.184.216.34".parse().unwrap()).unwrap();
        let mut buf = Vec::new();
        write_scan_header(&mut buf, &target, PortRange::new(20, 25).unwrap()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Scanning host 93.184.216.34 [example.com]\n"));
        assert!(text.contains("Ports 20-25 (6 total)"));
    }

    #[test]
    fn test_partial_and_closed() {
        let text = render(&[(5, PortState::Closed)], 1, 10);
        assert!(text.contains("Scan Cancelled! 1 of 10 ports probed"));
        assert!(text.contains("All ports were closed!"));
    }
}
