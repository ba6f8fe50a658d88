//! Hostname resolution.
//!
//! A scan resolves its target exactly once, before any probe is dispatched.
//! Failures are final: there is no retry and no partial scan.

use crate::error::ResolutionError;
use async_trait::async_trait;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Turns a hostname or IP literal into a connectable address.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, ResolutionError>;
}

/// DNS-backed resolver.
///
/// IP literals short-circuit without touching the network. Names are looked
/// up through the system resolver configuration when it can be read, falling
/// back to the library defaults otherwise.
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "system resolver config unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressResolver for DnsResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, ResolutionError> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(ResolutionError::new(hostname, "empty hostname"));
        }

        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Ok(ip);
        }

        let response = self
            .resolver
            .lookup_ip(hostname)
            .await
            .map_err(|e| ResolutionError::new(hostname, e.to_string()))?;

        // Prefer IPv4 when the name has both families.
        let mut addresses: Vec<IpAddr> = response.iter().collect();
        addresses.sort_by_key(|ip| ip.is_ipv6());
        let address = addresses
            .into_iter()
            .next()
            .ok_or_else(|| ResolutionError::new(hostname, "no addresses found"))?;

        tracing::debug!(%hostname, %address, "resolved target");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[tokio::test]
    async fn test_ip_literals_skip_lookup() {
        let resolver = DnsResolver::new();
        assert_eq!(
            resolver.resolve("127.0.0.1").await.unwrap(),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
        assert_eq!(
            resolver.resolve(" ::1 ").await.unwrap(),
            IpAddr::V6(Ipv6Addr::LOCALHOST)
        );
    }

    #[tokio::test]
    async fn test_empty_hostname_rejected() {
        let err = DnsResolver::new().resolve("   ").await.unwrap_err();
        assert_eq!(err.reason, "empty hostname");
    }

    #[tokio::test]
    async fn test_invalid_tld_fails() {
        // RFC 6761: `.invalid` never resolves.
        let err = DnsResolver::new()
            .resolve("no.such.host.invalid")
            .await
            .unwrap_err();
        assert_eq!(err.hostname, "no.such.host.invalid");
    }
}
