//! Text report logs.
//!
//! Renders a [`ScanReport`] into the plain-text log format and writes it to
//! disk. Whether an existing file may be replaced is decided up front by the
//! caller through [`OverwritePolicy`]; nothing here ever prompts.

use crate::error::{ReportError, ReportResult};
use crate::types::ScanReport;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const RULE: &str = "================================================";

/// What to do when the log file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Replace the existing file.
    Overwrite,
    /// Leave the existing file alone and fail.
    #[default]
    Refuse,
}

/// The automatic log file name for a report generated at `now`.
pub fn default_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("report_{}.log", now.format("%Y%m%d_%H%M%S"))
}

/// Render the log text for `report`.
pub fn render<Tz: TimeZone>(report: &ScanReport, generated_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let address = report
        .target
        .address()
        .map(|ip| ip.to_string())
        .unwrap_or_default();

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Scan report for {} [{}]", report.target.hostname(), address);
    let _ = writeln!(
        out,
        "Scanned ports {} to {}",
        report.range.start(),
        report.range.end()
    );
    if !report.complete {
        let _ = writeln!(
            out,
            "Scan incomplete: {} of {} ports probed",
            report.scanned_count,
            report.total_ports()
        );
    }
    let _ = writeln!(
        out,
        "Report generated on {}",
        generated_at.format("%B %d, %Y %H:%M:%S")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Scan Summary");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out);

    let mut any_open = false;
    for outcome in report.open_ports() {
        any_open = true;
        let _ = writeln!(out, "PORT {}: OPEN", outcome.port());
    }
    if !any_open {
        let _ = writeln!(out, "All Ports were CLOSED!");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", RULE);
    out
}

/// A destination for a report log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLog {
    path: PathBuf,
    policy: OverwritePolicy,
}

impl ReportLog {
    pub fn new(path: impl Into<PathBuf>, policy: OverwritePolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    /// A log in `dir` with the automatic timestamped name.
    pub fn timestamped(dir: impl AsRef<Path>, policy: OverwritePolicy) -> Self {
        Self::new(dir.as_ref().join(default_file_name(&Local::now())), policy)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    /// Whether a file is already sitting at the destination.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Render and write `report`, returning the path written.
    pub fn write(&self, report: &ScanReport) -> ReportResult<PathBuf> {
        let text = render(report, &Local::now());

        let mut options = OpenOptions::new();
        options.write(true);
        match self.policy {
            OverwritePolicy::Overwrite => options.create(true).truncate(true),
            OverwritePolicy::Refuse => options.create_new(true),
        };

        let result = options
            .open(&self.path)
            .and_then(|mut file| file.write_all(text.as_bytes()));

        match result {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "report log written");
                Ok(self.path.clone())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(ReportError::Exists(self.path.clone()))
            }
            Err(source) => Err(ReportError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
