//! Sync mode templates and backend configuration merge.
//!
//! Each sync mode has a template of mode-specific defaults. Building a
//! backend never touches a stored template: [`merge_config`] clones it,
//! overlays the device's mode-agnostic fields and any applicable overrides,
//! then fills in derived fields.

use wled_link_types::{
    ConfigError, DeviceConfig, SyncMode, DEFAULT_UNIVERSE_SIZE, MAX_PIXEL_COUNT, MAX_UNIVERSE,
};

/// WLED realtime protocol byte for DRGB (plain RGB triplets).
pub const DRGB_PROTOCOL: u8 = 2;

/// Default WLED realtime UDP port.
pub const UDP_PORT: u16 = 21324;

/// Default DDP port.
pub const DDP_PORT: u16 = 4048;

/// Default E1.31 port.
pub const E131_PORT: u16 = 5568;

/// Settings for WLED realtime UDP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpSettings {
    /// Destination port.
    pub port: u16,
    /// Prefix every pixel with its index.
    pub include_indexes: bool,
    /// Bytes prepended to every packet (protocol byte, timeout).
    pub data_prefix: Option<Vec<u8>>,
}

/// Settings for DDP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdpSettings {
    /// Destination port.
    pub port: u16,
}

/// Settings for E1.31.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E131Settings {
    /// Destination port.
    pub port: u16,
    /// First universe.
    pub universe: u16,
    /// Channels used per universe.
    pub universe_size: u16,
    /// First channel within the first universe.
    pub channel_offset: u16,
}

impl Default for UdpSettings {
    fn default() -> Self {
        Self {
            port: UDP_PORT,
            include_indexes: false,
            data_prefix: None,
        }
    }
}

impl Default for DdpSettings {
    fn default() -> Self {
        Self { port: DDP_PORT }
    }
}

impl Default for E131Settings {
    fn default() -> Self {
        Self {
            port: E131_PORT,
            universe: 1,
            universe_size: DEFAULT_UNIVERSE_SIZE,
            channel_offset: 0,
        }
    }
}

impl E131Settings {
    /// Number of universes a frame of `pixel_count` RGB pixels occupies.
    pub fn universe_count(&self, pixel_count: u32) -> u32 {
        let channels = u32::from(self.channel_offset) + pixel_count.saturating_mul(3);
        channels.div_ceil(u32::from(self.universe_size.max(1)))
    }

    /// Check that the offset fits the first universe and that every
    /// universe the frame needs is addressable.
    pub fn check(&self, pixel_count: u32) -> Result<(), ConfigError> {
        if self.channel_offset >= self.universe_size {
            return Err(ConfigError::ChannelOffsetOutOfRange {
                offset: self.channel_offset,
                universe_size: self.universe_size,
            });
        }
        let last = u32::from(self.universe) + self.universe_count(pixel_count).saturating_sub(1);
        if last > u32::from(MAX_UNIVERSE) {
            return Err(ConfigError::UniverseRangeExceeded {
                first: self.universe,
                last,
            });
        }
        Ok(())
    }
}

/// Mode-specific settings. Only the active mode's fields exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSettings {
    /// WLED realtime UDP.
    Udp(UdpSettings),
    /// DDP.
    Ddp(DdpSettings),
    /// E1.31.
    E131(E131Settings),
}

impl ModeSettings {
    /// The sync mode these settings belong to.
    pub fn mode(&self) -> SyncMode {
        match self {
            Self::Udp(_) => SyncMode::Udp,
            Self::Ddp(_) => SyncMode::Ddp,
            Self::E131(_) => SyncMode::E131,
        }
    }

    /// Destination port.
    pub fn port(&self) -> u16 {
        match self {
            Self::Udp(s) => s.port,
            Self::Ddp(s) => s.port,
            Self::E131(s) => s.port,
        }
    }
}

/// Fully merged configuration handed to a backend constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Device name.
    pub name: String,
    /// Hostname or IP address.
    pub ip_address: String,
    /// Number of pixels.
    pub pixel_count: u32,
    /// Mode-specific settings.
    pub settings: ModeSettings,
}

impl BackendConfig {
    /// The sync mode of this configuration.
    pub fn mode(&self) -> SyncMode {
        self.settings.mode()
    }
}

/// Default settings for a sync mode.
///
/// Returns a fresh value on every call.
pub fn template_for(mode: SyncMode) -> ModeSettings {
    match mode {
        SyncMode::Udp => ModeSettings::Udp(UdpSettings::default()),
        SyncMode::Ddp => ModeSettings::Ddp(DdpSettings::default()),
        SyncMode::E131 => ModeSettings::E131(E131Settings::default()),
    }
}

/// DRGB prefix carrying the realtime timeout: `[0x02, timeout]`.
pub fn udp_data_prefix(timeout: u8) -> Vec<u8> {
    vec![DRGB_PROTOCOL, timeout]
}

/// Merge a template with a device configuration.
///
/// The template is cloned, never modified. Name, address and pixel count
/// are copied verbatim from `config`. Overrides only apply to the fields
/// the template's mode has. For UDP, an explicit `data_prefix` override
/// wins; otherwise the prefix is derived from `config.timeout`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDataPrefix`] if the prefix override is not
/// hex, [`ConfigError::PixelCountTooLarge`] for strips too long to address,
/// and the E1.31 layout errors of [`E131Settings::check`].
pub fn merge_config(
    template: &ModeSettings,
    config: &DeviceConfig,
) -> Result<BackendConfig, ConfigError> {
    if config.pixel_count > MAX_PIXEL_COUNT {
        return Err(ConfigError::PixelCountTooLarge(config.pixel_count));
    }
    let overrides = &config.overrides;
    let mut settings = template.clone();

    match &mut settings {
        ModeSettings::Udp(udp) => {
            if let Some(port) = overrides.port {
                udp.port = port;
            }
            if let Some(include) = overrides.include_indexes {
                udp.include_indexes = include;
            }
            udp.data_prefix = Some(match overrides.data_prefix_bytes()? {
                Some(prefix) => prefix,
                None => udp_data_prefix(config.timeout),
            });
        }
        ModeSettings::Ddp(ddp) => {
            if let Some(port) = overrides.port {
                ddp.port = port;
            }
        }
        ModeSettings::E131(e131) => {
            if let Some(port) = overrides.port {
                e131.port = port;
            }
            if let Some(universe) = overrides.universe {
                e131.universe = universe;
            }
            if let Some(size) = overrides.universe_size {
                e131.universe_size = size;
            }
            if let Some(offset) = overrides.channel_offset {
                e131.channel_offset = offset;
            }
            e131.check(config.pixel_count)?;
        }
    }

    Ok(BackendConfig {
        name: config.name.clone(),
        ip_address: config.ip_address.clone(),
        pixel_count: config.pixel_count,
        settings,
    })
}
