//! Firmware version gate for negotiated controller features.
//!
//! Controllers at or above [`MIN_SYNC_API_VERSION`] accept writes to their
//! realtime interface settings. Which of those settings get written is up to
//! the caller ([`NegotiatorConfig::features`]); below the minimum, or when
//! the version string cannot be parsed, none are.

use serde::{Deserialize, Serialize};
use wled_link_types::{FirmwareVersion, SyncSettings, VersionError};

/// Oldest firmware that supports the sync settings API.
pub const MIN_SYNC_API_VERSION: FirmwareVersion = FirmwareVersion::new(0, 13, 0);

/// Controller settings that may only be written on supported firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatedFeature {
    /// Apply gamma correction to realtime data.
    RealtimeGamma,
    /// Set the controller's realtime timeout to the device timeout.
    InactivityTimeout,
    /// Listen on E1.31 universe 1.
    FirstUniverse,
    /// Start at DMX address 0.
    FirstDmxAddress,
    /// Multi-RGB DMX channel mapping.
    #[serde(rename = "multirgb_dmx_mode")]
    MultiRgbDmxMode,
}

/// Outcome of comparing a reported firmware version against the minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// At or above the minimum.
    Supported(FirmwareVersion),
    /// Parsed, but older than the minimum.
    BelowMinimum(FirmwareVersion),
    /// Could not be parsed; treated as below the minimum.
    Unparseable(VersionError),
}

impl GateDecision {
    /// Compare a raw firmware version string with `minimum`.
    pub fn evaluate(reported: &str, minimum: &FirmwareVersion) -> Self {
        match reported.parse::<FirmwareVersion>() {
            Ok(version) if &version >= minimum => Self::Supported(version),
            Ok(version) => Self::BelowMinimum(version),
            Err(e) => Self::Unparseable(e),
        }
    }

    /// Whether gated features may be written.
    pub fn allows_gated_features(&self) -> bool {
        matches!(self, Self::Supported(_))
    }
}

/// Negotiation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatorConfig {
    /// Minimum firmware for gated features (default: 0.13.0).
    #[serde(default = "default_min_version")]
    pub min_version: FirmwareVersion,
    /// Features to enable on supported firmware (default: none).
    #[serde(default)]
    pub features: Vec<GatedFeature>,
    /// Control channel request timeout in seconds (default: 5).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_min_version() -> FirmwareVersion {
    MIN_SYNC_API_VERSION
}

fn default_request_timeout_secs() -> u64 {
    5
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            min_version: default_min_version(),
            features: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl NegotiatorConfig {
    /// Set the features to enable on supported firmware.
    pub fn with_features(mut self, features: &[GatedFeature]) -> Self {
        self.features = features.to_vec();
        self
    }
}

/// Write `features` into `settings`, each at most once.
///
/// `timeout` is the device's realtime timeout in seconds. Returns the
/// features applied, in order.
pub fn apply_features(
    settings: &mut SyncSettings,
    features: &[GatedFeature],
    timeout: u8,
) -> Vec<GatedFeature> {
    let mut applied = Vec::with_capacity(features.len());
    for &feature in features {
        if applied.contains(&feature) {
            continue;
        }
        match feature {
            GatedFeature::RealtimeGamma => settings.enable_realtime_gamma(),
            GatedFeature::InactivityTimeout => settings.set_inactivity_timeout(timeout),
            GatedFeature::FirstUniverse => settings.first_universe(),
            GatedFeature::FirstDmxAddress => settings.first_dmx_address(),
            GatedFeature::MultiRgbDmxMode => settings.multirgb_dmx_mode(),
        }
        applied.push(feature);
    }
    applied
}
