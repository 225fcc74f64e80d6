//! What the controller reports about itself.

use serde::{Deserialize, Serialize};

use crate::{FirmwareVersion, VersionError};

/// Identity and geometry reported by the controller's control channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    /// Name configured on the controller.
    pub name: String,
    /// Number of pixels the controller drives.
    pub pixel_count: u32,
    /// Whether the strip has a white channel.
    pub rgbw: bool,
    /// Raw firmware version string (e.g. `0.13.0-b6`).
    pub firmware_version: String,
}

impl RemoteIdentity {
    /// Parse the reported firmware version.
    pub fn firmware(&self) -> Result<FirmwareVersion, VersionError> {
        self.firmware_version.parse()
    }
}
