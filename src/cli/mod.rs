//! Command-line interface definitions for portsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Everything
//! here is validated before any network activity happens.

pub mod scan;

use crate::config::{seconds, AppSettings};
use crate::error::{CliError, CliResult};
use crate::scanner::{ScanConfig, ScanRequest};
use crate::storage::{OverwritePolicy, ReportLog};
use crate::types::PortRange;
use clap::{value_parser, ArgGroup, Parser};
use std::path::PathBuf;

/// A fast, concurrent TCP port scanner.
///
/// Probes every port of a single port, a range, or all 65535 ports with
/// bounded concurrency and prints which ones accept connections.
#[derive(Parser, Debug)]
#[command(name = "portsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A fast, concurrent TCP port scanner", long_about = None)]
#[command(group(
    ArgGroup::new("selection")
        .required(true)
        .multiple(false)
        .args(["port", "range", "all"])
))]
pub struct Cli {
    /// Target IP address or hostname to scan
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Scan a specific port
    #[arg(short, long, value_parser = value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Scan a range of ports
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["START", "END"],
        value_parser = value_parser!(u16).range(1..)
    )]
    pub range: Option<Vec<u16>>,

    /// Scan all ports (1-65535)
    #[arg(short, long)]
    pub all: bool,

    /// Print every port as it completes (implies --status)
    #[arg(short, long)]
    pub verbose: bool,

    /// Show a progress bar while scanning
    #[arg(short, long)]
    pub status: bool,

    /// Connection timeout per port, in seconds [default: 1.5]
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Store the report in a log file, given as -l=PATH (named report_<timestamp>.log if PATH is omitted)
    #[arg(short, long, value_name = "PATH", num_args = 0..=1, require_equals = true)]
    pub log: Option<Option<PathBuf>>,

    /// Overwrite an existing log file without asking
    #[arg(long)]
    pub force: bool,

    /// Maximum number of concurrent probes [default: 500]
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Maximum probes started per second (0 = unlimited)
    #[arg(long, value_name = "PER_SECOND")]
    pub rate: Option<u32>,

    /// Stop the scan after this many seconds and report what finished
    #[arg(long, value_name = "SECONDS")]
    pub deadline: Option<f64>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit debug diagnostics on stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// The port range selected by `--port`, `--range` or `--all`.
    pub fn port_range(&self) -> CliResult<PortRange> {
        match (self.port, self.range.as_deref(), self.all) {
            (Some(port), None, false) => Ok(PortRange::new(port.into(), port.into())?),
            (None, Some(&[start, end]), false) => Ok(PortRange::new(start.into(), end.into())?),
            (None, None, true) => Ok(PortRange::all()),
            _ => Err(CliError::InvalidInput(
                "you must specify exactly one of --port, --range or --all".to_string(),
            )),
        }
    }

    /// The validated scan request.
    pub fn request(&self) -> CliResult<ScanRequest> {
        let range = self.port_range()?;
        Ok(ScanRequest::range(
            self.target.as_str(),
            range.start().as_u16().into(),
            range.end().as_u16().into(),
        ))
    }

    /// Scan configuration: settings first, flags on top.
    pub fn scan_config(&self, settings: &AppSettings) -> CliResult<ScanConfig> {
        let mut config = settings.scan_config()?;
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(seconds(timeout, "--timeout")?);
        }
        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                return Err(CliError::InvalidInput(
                    "--concurrency must be at least 1".to_string(),
                ));
            }
            config = config.with_concurrency(concurrency);
        }
        if let Some(rate) = self.rate {
            config = config.with_rate_limit(rate);
        }
        if let Some(deadline) = self.deadline {
            config = config.with_deadline(Some(seconds(deadline, "--deadline")?));
        }
        Ok(config)
    }

    /// Where to write the report log, if logging was requested.
    pub fn report_log(&self, settings: &AppSettings) -> Option<ReportLog> {
        let policy = if self.force {
            OverwritePolicy::Overwrite
        } else {
            OverwritePolicy::Refuse
        };
        let log = self.log.as_ref()?;
        Some(match log {
            Some(path) => ReportLog::new(path, policy),
            None => {
                let dir = settings.log_dir.clone().unwrap_or_else(|| PathBuf::from("."));
                ReportLog::timestamped(dir, policy)
            }
        })
    }

    /// Whether progress should be shown at all.
    pub fn shows_progress(&self) -> bool {
        self.status || self.verbose
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
