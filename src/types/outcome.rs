//! The result of probing one port.

use super::Port;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Classification of a single connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "detail")]
pub enum PortState {
    /// The connection was accepted.
    Open,
    /// The connection was actively refused.
    Closed,
    /// No answer within the probe timeout (filtered or unresponsive).
    #[serde(rename = "timed_out")]
    TimedOut,
    /// Any other I/O failure, such as an unreachable network.
    Error(String),
}

impl PortState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Error(detail) => write!(f, "error ({})", detail),
        }
    }
}

/// The outcome of one probe. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    port: Port,
    #[serde(flatten)]
    state: PortState,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    elapsed: Duration,
}

impl ProbeOutcome {
    pub fn new(port: Port, state: PortState, elapsed: Duration) -> Self {
        Self {
            port,
            state,
            elapsed,
        }
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn state(&self) -> &PortState {
        &self.state
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}
