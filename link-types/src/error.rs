//! Error types for wled-link configuration.

use thiserror::Error;

/// Errors raised while validating or resolving device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Sync mode is not registered
    #[error("unknown sync mode: {0}")]
    UnknownSyncMode(String),

    /// Pixel count must be positive
    #[error("pixel count must be positive")]
    InvalidPixelCount,

    /// Pixel count above what the wire formats can address
    #[error("pixel count {0} exceeds 65535")]
    PixelCountTooLarge(u32),

    /// Timeout outside the accepted range
    #[error("timeout {0}s out of range (0-10)")]
    TimeoutOutOfRange(u8),

    /// Device name is empty
    #[error("device name is empty")]
    EmptyName,

    /// Network address is empty
    #[error("network address is empty")]
    EmptyAddress,

    /// E1.31 universe outside 1..=63999
    #[error("invalid universe: {0}")]
    InvalidUniverse(u16),

    /// E1.31 universe size outside 1..=512
    #[error("invalid universe size: {0}")]
    InvalidUniverseSize(u16),

    /// Channel offset does not fit within the universe
    #[error("channel offset {offset} does not fit universe size {universe_size}")]
    ChannelOffsetOutOfRange {
        /// Configured channel offset.
        offset: u16,
        /// Configured universe size.
        universe_size: u16,
    },

    /// The frame would spill past the last E1.31 universe
    #[error("universes {first}..={last} exceed 63999")]
    UniverseRangeExceeded {
        /// First configured universe.
        first: u16,
        /// Last universe the frame would need.
        last: u32,
    },

    /// Data prefix is not valid hex
    #[error("invalid data prefix: {0}")]
    InvalidDataPrefix(String),
}

/// Firmware version string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed firmware version: {0:?}")]
pub struct VersionError(pub String);
