//! Process-wide configuration of the binding.
//!
//! The configuration is read from the environment the first time it is needed and then kept in
//! a global `RwLock`, so tests and embedding applications can override it with
//! [`DriverConfig::set`] or [`set_feature`] without touching the process environment.
//!
//! | Variable | Effect |
//! |---|---|
//! | `NIDAQMX_ENABLE_WAVEFORM_SUPPORT` | enables the waveform-returning read paths |
//! | `NIDAQMX_LIBRARY_PATH` | overrides the platform default driver library |

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::path::PathBuf;

use crate::error::{DaqError, Result};

pub const WAVEFORM_SUPPORT_ENV: &str = "NIDAQMX_ENABLE_WAVEFORM_SUPPORT";
pub const LIBRARY_PATH_ENV: &str = "NIDAQMX_LIBRARY_PATH";

/// Optional features that are disabled unless explicitly enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureToggle {
    WaveformSupport,
}

impl FeatureToggle {
    pub fn env_var(&self) -> &'static str {
        match self {
            FeatureToggle::WaveformSupport => WAVEFORM_SUPPORT_ENV,
        }
    }
}

impl fmt::Display for FeatureToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureToggle::WaveformSupport => write!(f, "WAVEFORM_SUPPORT"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DriverConfig {
    pub waveform_support: bool,
    pub library_path: Option<PathBuf>,
}

static CONFIG: Lazy<RwLock<DriverConfig>> = Lazy::new(|| RwLock::new(DriverConfig::from_env()));

// Accepts the usual spellings of "on".
fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl DriverConfig {
    pub fn from_env() -> Self {
        let waveform_support = std::env::var(WAVEFORM_SUPPORT_ENV).map(|v| parse_flag(&v)).unwrap_or(false);
        let library_path = std::env::var_os(LIBRARY_PATH_ENV)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        Self {
            waveform_support,
            library_path,
        }
    }

    /// Snapshot of the active configuration.
    pub fn current() -> Self {
        CONFIG.read().clone()
    }

    /// Replaces the active configuration.
    pub fn set(config: DriverConfig) {
        *CONFIG.write() = config;
    }

    /// Re-reads the environment.
    pub fn reload() {
        Self::set(Self::from_env());
    }

    pub fn is_enabled(&self, feature: FeatureToggle) -> bool {
        match feature {
            FeatureToggle::WaveformSupport => self.waveform_support,
        }
    }
}

pub fn is_feature_enabled(feature: FeatureToggle) -> bool {
    CONFIG.read().is_enabled(feature)
}

pub fn set_feature(feature: FeatureToggle, enabled: bool) {
    let mut config = CONFIG.write();
    match feature {
        FeatureToggle::WaveformSupport => config.waveform_support = enabled,
    }
}

/// Fails with [`DaqError::FeatureNotSupported`] unless `feature` is enabled.
pub fn requires_feature(feature: FeatureToggle) -> Result<()> {
    if is_feature_enabled(feature) {
        Ok(())
    } else {
        Err(DaqError::FeatureNotSupported {
            feature: feature.to_string(),
            env_var: feature.env_var().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        for on in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(parse_flag(on), "{on}");
        }
        for off in ["0", "", "false", "enabled"] {
            assert!(!parse_flag(off), "{off}");
        }
    }

    #[test]
    fn disabled_feature_names_env_var() {
        let config = DriverConfig::default();
        assert!(!config.is_enabled(FeatureToggle::WaveformSupport));
        let err = DaqError::FeatureNotSupported {
            feature: FeatureToggle::WaveformSupport.to_string(),
            env_var: FeatureToggle::WaveformSupport.env_var().to_string(),
        };
        assert!(err.to_string().contains("NIDAQMX_ENABLE_WAVEFORM_SUPPORT=1"));
    }
}
