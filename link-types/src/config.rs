//! Locally held device configuration.
//!
//! Fields that apply to every sync mode (name, address, pixel count) live
//! directly on [`DeviceConfig`]. Mode-specific values are optional
//! [`ModeOverrides`]; each sync mode supplies its own defaults for them.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, SyncMode};

/// Default seconds the controller waits after the last realtime frame
/// before resuming its own effects.
pub const DEFAULT_TIMEOUT: u8 = 1;

/// Largest accepted realtime timeout, in seconds.
pub const MAX_TIMEOUT: u8 = 10;

/// Largest accepted pixel count. DNRGB start indexes are 16 bits wide.
pub const MAX_PIXEL_COUNT: u32 = u16::MAX as u32;

/// Highest E1.31 universe number.
pub const MAX_UNIVERSE: u16 = 63999;

/// E1.31 channels per universe unless overridden.
pub const DEFAULT_UNIVERSE_SIZE: u16 = 510;

const MAX_UNIVERSE_SIZE: u16 = 512;

/// Configuration for one logical WLED device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Human-readable device name.
    pub name: String,
    /// Hostname or IP address of the controller.
    pub ip_address: String,
    /// Number of pixels on the strip.
    pub pixel_count: u32,
    /// Streaming protocol (default: UDP).
    #[serde(default)]
    pub sync_mode: SyncMode,
    /// Seconds between the last realtime frame and the controller
    /// resuming its own effect (default: 1, range 0-10).
    #[serde(default = "default_timeout")]
    pub timeout: u8,
    /// Whether the strip has a fourth (white) channel.
    #[serde(default)]
    pub rgbw_led: bool,
    /// Mode-specific overrides of the sync mode defaults.
    #[serde(flatten)]
    pub overrides: ModeOverrides,
}

/// Optional mode-specific settings. Unset fields take the sync mode's default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeOverrides {
    /// Destination UDP port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Hex-encoded bytes prepended to every UDP realtime packet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_prefix: Option<String>,
    /// Prefix every UDP pixel with its index (WARLS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_indexes: Option<bool>,
    /// First E1.31 universe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe: Option<u16>,
    /// Channels used per E1.31 universe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_size: Option<u16>,
    /// First channel within the first universe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_offset: Option<u16>,
}

fn default_timeout() -> u8 {
    DEFAULT_TIMEOUT
}

impl DeviceConfig {
    /// Create a configuration with default sync mode and timeout.
    pub fn new(name: &str, ip_address: &str, pixel_count: u32) -> Self {
        Self {
            name: name.to_string(),
            ip_address: ip_address.to_string(),
            pixel_count,
            sync_mode: SyncMode::default(),
            timeout: DEFAULT_TIMEOUT,
            rgbw_led: false,
            overrides: ModeOverrides::default(),
        }
    }

    /// Set the sync mode.
    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    /// Set the realtime timeout.
    pub fn with_timeout(mut self, timeout: u8) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the mode-specific overrides.
    pub fn with_overrides(mut self, overrides: ModeOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Check every field against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.ip_address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        if self.pixel_count == 0 {
            return Err(ConfigError::InvalidPixelCount);
        }
        if self.pixel_count > MAX_PIXEL_COUNT {
            return Err(ConfigError::PixelCountTooLarge(self.pixel_count));
        }
        if self.timeout > MAX_TIMEOUT {
            return Err(ConfigError::TimeoutOutOfRange(self.timeout));
        }
        self.overrides.validate()
    }
}

impl ModeOverrides {
    /// Check the override values that have fixed protocol limits.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(universe) = self.universe {
            if universe == 0 || universe > MAX_UNIVERSE {
                return Err(ConfigError::InvalidUniverse(universe));
            }
        }
        if let Some(size) = self.universe_size {
            if size == 0 || size > MAX_UNIVERSE_SIZE {
                return Err(ConfigError::InvalidUniverseSize(size));
            }
        }
        if let Some(offset) = self.channel_offset {
            let universe_size = self.universe_size.unwrap_or(DEFAULT_UNIVERSE_SIZE);
            if offset >= universe_size {
                return Err(ConfigError::ChannelOffsetOutOfRange {
                    offset,
                    universe_size,
                });
            }
        }
        self.data_prefix_bytes().map(|_| ())
    }

    /// Decode the hex data prefix, if one is set.
    pub fn data_prefix_bytes(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        self.data_prefix
            .as_deref()
            .map(|prefix| {
                hex::decode(prefix).map_err(|_| ConfigError::InvalidDataPrefix(prefix.to_string()))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> DeviceConfig {
        DeviceConfig::new("strip1", "10.0.0.5", 300)
    }

    // ===========================================
    // Defaults
    // ===========================================

    #[test]
    fn new_uses_defaults() {
        let config = strip();
        assert_eq!(config.sync_mode, SyncMode::Udp);
        assert_eq!(config.timeout, 1);
        assert!(!config.rgbw_led);
        assert_eq!(config.overrides, ModeOverrides::default());
    }

    #[test]
    fn builder_pattern() {
        let config = strip().with_sync_mode(SyncMode::E131).with_timeout(5);
        assert_eq!(config.sync_mode, SyncMode::E131);
        assert_eq!(config.timeout, 5);
    }

    #[test]
    fn from_toml_missing_fields_use_defaults() {
        let toml = r#"
name = "desk"
ip_address = "wled-desk.local"
pixel_count = 60
"#;
        let config: DeviceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sync_mode, SyncMode::Udp);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.overrides.port.is_none());
    }

    #[test]
    fn from_toml_with_overrides() {
        let toml = r#"
name = "stage"
ip_address = "10.0.0.9"
pixel_count = 680
sync_mode = "E131"
universe = 3
channel_offset = 6
"#;
        let config: DeviceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sync_mode, SyncMode::E131);
        assert_eq!(config.overrides.universe, Some(3));
        assert_eq!(config.overrides.channel_offset, Some(6));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_sync_mode_fails_to_parse() {
        let toml = r#"
name = "x"
ip_address = "10.0.0.1"
pixel_count = 1
sync_mode = "ARTNET"
"#;
        assert!(toml::from_str::<DeviceConfig>(toml).is_err());
    }

    // ===========================================
    // Validation
    // ===========================================

    #[test]
    fn valid_config_passes() {
        assert!(strip().validate().is_ok());
        assert!(strip().with_timeout(0).validate().is_ok());
        assert!(strip().with_timeout(10).validate().is_ok());
    }

    #[test]
    fn timeout_above_ten_rejected() {
        assert_eq!(
            strip().with_timeout(11).validate(),
            Err(ConfigError::TimeoutOutOfRange(11))
        );
    }

    #[test]
    fn zero_pixels_rejected() {
        let config = DeviceConfig::new("strip1", "10.0.0.5", 0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPixelCount));
    }

    #[test]
    fn empty_name_and_address_rejected() {
        assert_eq!(
            DeviceConfig::new(" ", "10.0.0.5", 1).validate(),
            Err(ConfigError::EmptyName)
        );
        assert_eq!(
            DeviceConfig::new("a", "", 1).validate(),
            Err(ConfigError::EmptyAddress)
        );
    }

    #[test]
    fn universe_bounds() {
        let overrides = ModeOverrides {
            universe: Some(0),
            ..Default::default()
        };
        assert_eq!(overrides.validate(), Err(ConfigError::InvalidUniverse(0)));

        let overrides = ModeOverrides {
            universe_size: Some(513),
            ..Default::default()
        };
        assert_eq!(
            overrides.validate(),
            Err(ConfigError::InvalidUniverseSize(513))
        );
    }

    #[test]
    fn channel_offset_must_fit_universe() {
        let overrides = ModeOverrides {
            universe_size: Some(510),
            channel_offset: Some(510),
            ..Default::default()
        };
        assert_eq!(
            overrides.validate(),
            Err(ConfigError::ChannelOffsetOutOfRange {
                offset: 510,
                universe_size: 510
            })
        );
    }

    #[test]
    fn channel_offset_checked_against_default_universe_size() {
        for offset in [510, 511] {
            let overrides = ModeOverrides {
                channel_offset: Some(offset),
                ..Default::default()
            };
            assert_eq!(
                overrides.validate(),
                Err(ConfigError::ChannelOffsetOutOfRange {
                    offset,
                    universe_size: DEFAULT_UNIVERSE_SIZE
                })
            );
        }

        let overrides = ModeOverrides {
            channel_offset: Some(509),
            ..Default::default()
        };
        assert!(overrides.validate().is_ok());
    }

    #[test]
    fn pixel_count_capped() {
        assert!(DeviceConfig::new("strip1", "10.0.0.5", MAX_PIXEL_COUNT)
            .validate()
            .is_ok());
        assert_eq!(
            DeviceConfig::new("strip1", "10.0.0.5", MAX_PIXEL_COUNT + 1).validate(),
            Err(ConfigError::PixelCountTooLarge(65536))
        );
    }

    #[test]
    fn data_prefix_decodes_hex() {
        let overrides = ModeOverrides {
            data_prefix: Some("0205".into()),
            ..Default::default()
        };
        assert_eq!(overrides.data_prefix_bytes(), Ok(Some(vec![0x02, 0x05])));

        let overrides = ModeOverrides {
            data_prefix: Some("zz".into()),
            ..Default::default()
        };
        assert!(matches!(
            overrides.validate(),
            Err(ConfigError::InvalidDataPrefix(_))
        ));
    }
}
