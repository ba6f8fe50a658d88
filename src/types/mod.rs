//! Core type definitions using newtype patterns for type safety.
//!
//! These types make invalid ports, ranges and double-resolved targets
//! unrepresentable or rejected at construction.

mod outcome;
mod port;
mod report;
mod target;

pub use outcome::{PortState, ProbeOutcome};
pub use port::{Port, PortError, PortRange};
pub use report::ScanReport;
pub use target::{Target, TargetError};
