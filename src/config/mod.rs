//! Configuration management for portsweep.
//!
//! Provides XDG-compliant settings storage used to seed scan defaults.

mod settings;

pub use settings::{seconds, AppSettings, Paths};
