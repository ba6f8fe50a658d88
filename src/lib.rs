//! # portsweep - a concurrent TCP port scanner
//!
//! portsweep probes a port range on one host with TCP connects, many at a
//! time, and reports which ports accept connections.
//!
//! ## Features
//!
//! - **Bounded concurrency**: a FIFO permit pool caps open sockets
//! - **Rate limiting**: optional token-bucket pacing of new probes
//! - **Cancellation**: explicit cancel or overall deadline yields a
//!   partial report that is clearly marked as such
//! - **Deterministic reports**: outcomes are port-sorted and deduplicated
//!   regardless of completion order
//! - **Multiple Output Formats**: Plain text, JSON, and CSV, plus text report logs
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portsweep::scanner::{ScanConfig, ScanController, ScanRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScanConfig::new().with_timeout(Duration::from_millis(500));
//!     let controller = ScanController::tcp(config);
//!
//!     let report = controller
//!         .run(ScanRequest::range("localhost", 1, 1024))
//!         .await
//!         .unwrap();
//!
//!     for outcome in report.open_ports() {
//!         println!("Port {} is open", outcome.port());
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ports, ranges, targets, outcomes and reports
//! - [`scanner`] - Resolver, prober, limiter, scheduler, aggregator and controller
//! - [`config`] - Settings file handling
//! - [`storage`] - Text report logs
//! - [`output`] - Output formatting utilities
//! - [`cli`] - Command-line front end
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ResolutionError, ScanError};
pub use scanner::{ScanConfig, ScanController, ScanRequest, ScanState};
pub use types::{Port, PortRange, PortState, ProbeOutcome, ScanReport, Target};
