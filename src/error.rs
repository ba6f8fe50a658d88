//! Error types for portsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Per-port failures are
//! not errors: they are recorded as [`PortState`](crate::types::PortState)
//! values and never show up here.

use crate::types::{Port, PortError, PortRange, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop a scan before or instead of producing a report.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("result aggregation invariant violated: {0}")]
    Aggregation(#[from] AggregateError),

    #[error("concurrency limiter was closed")]
    LimiterClosed,

    #[error("this controller has already run a scan")]
    AlreadyStarted,
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// A hostname could not be turned into an address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot resolve hostname '{hostname}': {reason}")]
pub struct ResolutionError {
    pub hostname: String,
    pub reason: String,
}

impl ResolutionError {
    pub fn new(hostname: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            reason: reason.into(),
        }
    }
}

/// Violations of the one-outcome-per-port rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("duplicate outcome for port {0}")]
    Duplicate(Port),

    #[error("port {port} is outside the scanned range {range}")]
    OutOfRange { port: Port, range: PortRange },

    #[error("outcome added after the report was finalized")]
    Finalized,
}

/// Errors while persisting a report log.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("log file {0} already exists")]
    Exists(PathBuf),

    #[error("failed to write log file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for report persistence.
pub type ReportResult<T> = Result<T, ReportError>;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid config format: {0}")]
    InvalidFormat(String),

    #[error("invalid setting: {0}")]
    InvalidValue(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("{0}")]
    InvalidInput(String),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
