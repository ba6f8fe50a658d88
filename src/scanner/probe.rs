//! Single-port TCP connect probing.
//!
//! A probe opens one connection attempt, classifies what happened and
//! closes the socket again. It never fails: every I/O problem becomes a
//! [`PortState`] on the returned outcome.

use crate::types::{Port, PortState, ProbeOutcome};
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Trait for probe implementations.
///
/// Abstracts the connection attempt so the scheduler can be driven by
/// scripted or instrumented probers in tests.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe one port. Must return within `timeout` plus a small overhead.
    async fn probe(&self, address: IpAddr, port: Port, timeout: Duration) -> ProbeOutcome;
}

/// TCP connect prober.
///
/// Uses standard socket connect() calls to determine port state. Completes
/// the full handshake on open ports, so no elevated privileges are needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

impl TcpProber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, address: IpAddr, port: Port, limit: Duration) -> ProbeOutcome {
        let addr = SocketAddr::new(address, port.as_u16());
        let start = Instant::now();

        // The stream (or the pending connect future) is dropped on every
        // branch below, which closes the socket.
        let state = match timeout(limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                PortState::Open
            }
            Ok(Err(e)) => classify_error(&e),
            Err(_) => PortState::TimedOut,
        };
        let elapsed = start.elapsed();

        tracing::trace!(%addr, state = %state, ?elapsed, "probe finished");
        ProbeOutcome::new(port, state, elapsed)
    }
}

/// Map a connect error to a port state.
fn classify_error(e: &io::Error) -> PortState {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => PortState::Closed,
        io::ErrorKind::TimedOut => PortState::TimedOut,
        _ => PortState::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_error_classification() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(classify_error(&refused), PortState::Closed);

        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(classify_error(&timed_out), PortState::TimedOut);

        let other = io::Error::new(io::ErrorKind::Other, "network is unreachable");
        assert_eq!(
            classify_error(&other),
            PortState::Error("network is unreachable".to_string())
        );
    }

    #[tokio::test]
    async fn test_open_port() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let outcome = TcpProber::new()
            .probe(LOCALHOST, port, Duration::from_secs(1))
            .await;

        assert_eq!(outcome.port(), port);
        assert_eq!(outcome.state(), &PortState::Open);
    }

    #[tokio::test]
    async fn test_closed_port() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        drop(listener);

        let outcome = TcpProber::new()
            .probe(LOCALHOST, port, Duration::from_secs(1))
            .await;

        assert!(matches!(
            outcome.state(),
            PortState::Closed | PortState::TimedOut
        ));
        assert!(outcome.elapsed() < Duration::from_secs(2));
    }
}
