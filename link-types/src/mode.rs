//! Sync mode selector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// Streaming protocol used to push pixel frames to the controller.
///
/// Recommended: UDP below ~480 pixels, DDP above.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum SyncMode {
    /// WLED realtime UDP (DRGB/DNRGB/WARLS).
    #[default]
    #[serde(rename = "UDP")]
    Udp,
    /// Distributed Display Protocol.
    #[serde(rename = "DDP")]
    Ddp,
    /// ANSI E1.31 streaming ACN.
    #[serde(rename = "E131")]
    E131,
}

impl SyncMode {
    /// All modes, in registration order.
    pub const ALL: [SyncMode; 3] = [SyncMode::Udp, SyncMode::Ddp, SyncMode::E131];

    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Ddp => "DDP",
            Self::E131 => "E131",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UDP" => Ok(Self::Udp),
            "DDP" => Ok(Self::Ddp),
            "E131" | "E1.31" | "SACN" => Ok(Self::E131),
            _ => Err(ConfigError::UnknownSyncMode(s.to_string())),
        }
    }
}
