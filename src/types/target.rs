//! The host a scan is aimed at.
//!
//! A `Target` starts out as the name the user typed. The resolver binds it to
//! an address exactly once; after that the address never changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A scan target: the original hostname plus its resolved address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    hostname: String,
    address: Option<IpAddr>,
}

impl Target {
    /// Create an unresolved target.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into().trim().to_string(),
            address: None,
        }
    }

    /// The name as given by the user.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The resolved address, if resolution has happened.
    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    pub fn is_resolved(&self) -> bool {
        self.address.is_some()
    }

    /// Bind the resolved address. Fails if the target was already bound.
    pub fn set_address(&mut self, address: IpAddr) -> Result<(), TargetError> {
        match self.address {
            Some(existing) => Err(TargetError::AlreadyResolved {
                hostname: self.hostname.clone(),
                address: existing,
            }),
            None => {
                self.address = Some(address);
                Ok(())
            }
        }
    }

    /// The resolved address, or an error naming the unresolved host.
    pub fn require_address(&self) -> Result<IpAddr, TargetError> {
        self.address
            .ok_or_else(|| TargetError::Unresolved(self.hostname.clone()))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(ip) if ip.to_string() != self.hostname => write!(f, "{} [{}]", self.hostname, ip),
            _ => write!(f, "{}", self.hostname),
        }
    }
}

/// Error type for target binding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("target '{hostname}' is already resolved to {address}")]
    AlreadyResolved { hostname: String, address: IpAddr },
    #[error("target '{0}' has not been resolved")]
    Unresolved(String),
    #[error("target must not be empty")]
    Empty,
}
