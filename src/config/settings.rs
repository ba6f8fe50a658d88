//! Application settings and paths.
//!
//! Settings live in an XDG-compliant config directory as JSON. Every field
//! has a default, so a missing or partial file is fine.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::{ScanConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Global paths singleton. `None` when no home directory can be found.
static PATHS: OnceLock<Option<Paths>> = OnceLock::new();

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portsweep)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance.
    pub fn get() -> Option<&'static Paths> {
        PATHS.get_or_init(Self::discover).as_ref()
    }

    fn discover() -> Option<Self> {
        let project = ProjectDirs::from("", "", "portsweep")?;
        Some(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default concurrency level.
    pub default_concurrency: usize,
    /// Default per-probe timeout in seconds.
    pub default_timeout_secs: f64,
    /// Maximum probe dispatches per second, 0 for unlimited.
    pub default_rate_limit: u32,
    /// Overall scan deadline in seconds, if any.
    pub default_deadline_secs: Option<f64>,
    /// Directory for automatically named report logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_concurrency: DEFAULT_MAX_CONCURRENCY,
            default_timeout_secs: DEFAULT_TIMEOUT.as_secs_f64(),
            default_rate_limit: 0,
            default_deadline_secs: None,
            log_dir: None,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if there is none.
    pub fn load() -> ConfigResult<Self> {
        match Paths::get().map(Paths::settings_file) {
            Some(file) if file.exists() => Self::load_from(&file),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Reject values no scan could run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "default_concurrency must be at least 1".to_string(),
            ));
        }
        seconds(self.default_timeout_secs, "default_timeout_secs")?;
        if let Some(deadline) = self.default_deadline_secs {
            seconds(deadline, "default_deadline_secs")?;
        }
        Ok(())
    }

    /// A scan configuration seeded from these settings.
    pub fn scan_config(&self) -> ConfigResult<ScanConfig> {
        let deadline = self
            .default_deadline_secs
            .map(|secs| seconds(secs, "default_deadline_secs"))
            .transpose()?;

        Ok(ScanConfig::new()
            .with_timeout(seconds(self.default_timeout_secs, "default_timeout_secs")?)
            .with_concurrency(self.default_concurrency)
            .with_rate_limit(self.default_rate_limit)
            .with_deadline(deadline))
    }
}

/// Convert a positive, finite number of seconds into a duration.
pub fn seconds(secs: f64, name: &str) -> ConfigResult<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(ConfigError::InvalidValue(format!(
            "{} must be a positive number of seconds, got {}",
            name, secs
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.default_concurrency, 500);
        assert_eq!(settings.default_timeout_secs, 1.5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "default_concurrency": 64, "default_deadline_secs": 30 }"#).unwrap();

        let settings = AppSettings::load_from(&path).unwrap();
        assert_eq!(settings.default_concurrency, 64);
        assert_eq!(settings.default_timeout_secs, 1.5);

        let config = settings.scan_config().unwrap();
        assert_eq!(config.max_concurrency, 64);
        assert_eq!(config.deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "default_timeout_secs": -1.0 }"#).unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidValue(_))
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AppSettings::load_from(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }

    #[test]
    fn test_seconds() {
        assert_eq!(seconds(1.5, "t").unwrap(), Duration::from_millis(1500));
        assert!(seconds(0.0, "t").is_err());
        assert!(seconds(f64::NAN, "t").is_err());
        assert!(seconds(f64::INFINITY, "t").is_err());
    }
}
