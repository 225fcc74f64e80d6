//! # link-types
//!
//! Configuration and identity types for wled-link.
//!
//! This crate provides the foundational types used across all wled-link crates:
//! - [`SyncMode`] - Streaming protocol selector (UDP, DDP, E1.31)
//! - [`DeviceConfig`], [`ModeOverrides`] - Locally held device configuration
//! - [`RemoteIdentity`] - What the controller reports about itself
//! - [`FirmwareVersion`] - Comparable controller firmware version
//! - [`SyncSettings`] - The controller's live interface settings document
//! - [`ConfigError`], [`VersionError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod identity;
mod mode;
mod settings;
mod version;

pub use config::{
    DeviceConfig, ModeOverrides, DEFAULT_TIMEOUT, DEFAULT_UNIVERSE_SIZE, MAX_PIXEL_COUNT,
    MAX_TIMEOUT, MAX_UNIVERSE,
};
pub use error::{ConfigError, VersionError};
pub use identity::RemoteIdentity;
pub use mode::SyncMode;
pub use settings::SyncSettings;
pub use version::FirmwareVersion;

/// One pixel: red, green, blue.
pub type Rgb = [u8; 3];
