//! Configuration file for wled-link.
//!
//! ```toml
//! [device]
//! name = "strip1"
//! ip_address = "10.0.0.5"
//! pixel_count = 300
//! sync_mode = "UDP"
//! timeout = 2
//!
//! [negotiation]
//! min_version = "0.13.0"
//! features = ["realtime_gamma", "inactivity_timeout"]
//! request_timeout_secs = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use wled_link_core::NegotiatorConfig;
use wled_link_types::DeviceConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "wled-link.toml";

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The controller to talk to.
    pub device: DeviceConfig,
    /// Capability negotiation settings.
    #[serde(default)]
    pub negotiation: NegotiatorConfig,
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config
            .device
            .validate()
            .map_err(|e| ConfigError::Invalid {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(config)
    }

    /// Control channel request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.negotiation.request_timeout_secs)
    }
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Configuration values out of range.
    #[error("invalid device config in {path}: {source}")]
    Invalid {
        /// Path to the configuration file.
        path: PathBuf,
        /// Validation failure.
        source: wled_link_types::ConfigError,
    },
}
