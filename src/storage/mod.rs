//! Scan report persistence.
//!
//! Writes plain-text report logs for finished (or cancelled) scans.

mod log_file;

pub use log_file::{default_file_name, render, OverwritePolicy, ReportLog};
